//! Content fingerprints for generated artifacts

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `data` (64 lowercase characters)
///
/// # Examples
///
/// ```
/// use census::core::artifact::fingerprint::fingerprint;
///
/// let digest = fingerprint(b"census");
/// assert_eq!(digest.len(), 64);
/// ```
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    format!("{result:x}")
}

/// Whether `data` hashes to `expected`; hex case is ignored
pub fn matches(data: &[u8], expected: &str) -> bool {
    fingerprint(data).eq_ignore_ascii_case(expected.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_different_content_different_digest() {
        assert_ne!(fingerprint(b"{\"a\":1}"), fingerprint(b"{\"a\":2}"));
    }

    #[test]
    fn test_matches_ignores_case() {
        let digest = fingerprint(b"payload").to_uppercase();
        assert!(matches(b"payload", &digest));
        assert!(!matches(b"payload2", &digest));
    }
}
