//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Secret bytes are not valid UTF-8 text
    #[error("secret is not valid utf-8 (error at byte {valid_up_to})")]
    InvalidUtf8 {
        /// Length of the valid prefix
        valid_up_to: usize,
    },

    /// Digest has the wrong length
    #[error("invalid digest length: expected {expected}, got {actual}")]
    InvalidDigestLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },
}
