//! Result type alias for Census
//!
//! This module provides a convenient Result type alias that uses CensusError
//! as the error type.

use super::errors::CensusError;

/// Result type alias for Census operations
///
/// # Examples
///
/// ```
/// use census::domain::result::Result;
/// use census::domain::errors::CensusError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(CensusError::Configuration("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, CensusError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{CensusError, JobError};

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(CensusError::Job(JobError::Cancelled));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> std::result::Result<i32, JobError> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
