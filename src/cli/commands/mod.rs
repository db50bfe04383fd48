//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod export;
pub mod history;
pub mod init;
pub mod validate;
