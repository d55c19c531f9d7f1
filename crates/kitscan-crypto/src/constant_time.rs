//! Constant-time comparison.
//!
//! Digest comparison must not leak how many leading characters of a
//! declared hash matched. Execution time depends only on input length.

use subtle::ConstantTimeEq;

/// Constant-time comparison of byte slices.
///
/// Returns `true` if slices are equal, `false` otherwise.
/// Slices of different length compare unequal immediately.
#[must_use]
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}

/// Case-sensitive constant-time comparison of two strings.
///
/// Used for hex digests: `"AB"` and `"ab"` are different.
#[must_use]
pub fn ct_eq_str(a: &str, b: &str) -> bool {
    ct_eq(a.as_bytes(), b.as_bytes())
}
