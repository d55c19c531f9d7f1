//! Wipe-on-drop containers for key material.
//!
//! Every buffer that may hold part of a transferred private key lives in
//! one of these types. Dropping them overwrites the backing memory, and
//! growing a [`SecretBuffer`] wipes the old allocation before releasing it,
//! so no stale copy of the key is left behind by a reallocation.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Growable byte buffer that zeroizes its memory on drop and on growth.
#[derive(Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretBuffer {
    bytes: Vec<u8>,
}

impl SecretBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    /// Take ownership of an existing vector without copying it.
    #[must_use]
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Number of bytes held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Current allocation size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Borrow the contents.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Ensure room for `additional` more bytes.
    ///
    /// When the current allocation is too small a new one is made, the
    /// contents copied over, and the old allocation wiped before release.
    pub fn reserve(&mut self, additional: usize) {
        let required = self.bytes.len().saturating_add(additional);
        if required <= self.bytes.capacity() {
            return;
        }

        let new_capacity = required.max(self.bytes.capacity().saturating_mul(2));
        let mut grown = Vec::with_capacity(new_capacity);
        grown.extend_from_slice(&self.bytes);
        self.bytes.zeroize();
        self.bytes = grown;
    }

    /// Append bytes at the end.
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.reserve(data.len());
        self.bytes.extend_from_slice(data);
    }

    /// Insert bytes at `offset`, shifting the tail right.
    ///
    /// # Panics
    ///
    /// Panics if `offset > self.len()`.
    pub fn insert_slice(&mut self, offset: usize, data: &[u8]) {
        assert!(offset <= self.bytes.len(), "insert offset out of bounds");

        self.extend_from_slice(data);
        self.bytes[offset..].rotate_right(data.len());
    }

    /// Wipe the contents, keeping the buffer usable.
    pub fn clear(&mut self) {
        self.bytes.zeroize();
    }

    /// Convert into a [`SecretString`], wiping the bytes if they are not UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidUtf8`] if the contents are not valid UTF-8.
    pub fn into_secret_string(mut self) -> Result<SecretString, CryptoError> {
        let bytes = std::mem::take(&mut self.bytes);
        match String::from_utf8(bytes) {
            Ok(text) => Ok(SecretString::from(text)),
            Err(err) => {
                let valid_up_to = err.utf8_error().valid_up_to();
                err.into_bytes().zeroize();
                Err(CryptoError::InvalidUtf8 { valid_up_to })
            }
        }
    }
}

impl From<&[u8]> for SecretBuffer {
    fn from(data: &[u8]) -> Self {
        let mut buf = Self::with_capacity(data.len());
        buf.extend_from_slice(data);
        buf
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuffer([REDACTED; {} bytes])", self.bytes.len())
    }
}

/// UTF-8 text that zeroizes its memory on drop.
#[derive(Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    text: String,
}

impl SecretString {
    /// Borrow the secret text.
    ///
    /// Callers must not copy the text into memory they do not wipe.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<String> for SecretString {
    fn from(text: String) -> Self {
        Self { text }
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED; {} bytes])", self.text.len())
    }
}
