//! Body integrity verification.

use tracing::warn;

use kitscan_crypto::constant_time::ct_eq_str;
use kitscan_crypto::sha512_hex;

use crate::error::TransferError;

/// Check the body against the digest declared by the first page.
///
/// The SHA-512 of `body` is hex encoded in lowercase and compared
/// case-sensitively in constant time.
///
/// # Errors
///
/// Returns [`TransferError::HashMismatch`] if the digests differ.
pub fn verify_integrity(body: &[u8], declared_hash: &str) -> Result<(), TransferError> {
    let computed = sha512_hex(body);

    if ct_eq_str(&computed, declared_hash) {
        Ok(())
    } else {
        warn!(body_len = body.len(), "body digest does not match first page");
        Err(TransferError::HashMismatch)
    }
}
