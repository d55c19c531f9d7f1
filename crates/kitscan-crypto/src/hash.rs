//! SHA-512 hashing for transfer body integrity.
//!
//! The first page of a paged transfer declares the digest of the whole
//! concatenated body as lowercase hex. This module produces digests in
//! exactly that form.

use sha2::{Digest, Sha512};

use crate::error::CryptoError;
use crate::{SHA512_HEX_LEN, SHA512_OUTPUT_SIZE};

/// SHA-512 hash output (64 bytes).
pub type HashOutput = [u8; SHA512_OUTPUT_SIZE];

/// Compute the SHA-512 hash of input data.
#[must_use]
pub fn sha512(data: &[u8]) -> HashOutput {
    Sha512::digest(data).into()
}

/// Compute the SHA-512 hash of input data as lowercase hex.
#[must_use]
pub fn sha512_hex(data: &[u8]) -> String {
    hex::encode(sha512(data))
}

/// Check that a declared digest has the shape of a SHA-512 hex string.
///
/// Only the length is enforced; character case is left to the comparison,
/// which is case-sensitive.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidDigestLength`] if `declared` is not 128 characters.
pub fn check_hex_digest_len(declared: &str) -> Result<(), CryptoError> {
    if declared.len() == SHA512_HEX_LEN {
        Ok(())
    } else {
        Err(CryptoError::InvalidDigestLength {
            expected: SHA512_HEX_LEN,
            actual: declared.len(),
        })
    }
}
