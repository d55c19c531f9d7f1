//! # KITSCAN Crypto
//!
//! Cryptographic primitives for the KITSCAN account-transfer engine.
//!
//! This crate provides:
//! - SHA-512 digests in the lowercase hex form declared by transfer first pages
//! - Constant-time comparison of digests
//! - Wipe-on-drop containers for key material (`SecretBuffer`, `SecretString`)
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm | Notes |
//! |----------|-----------|-------|
//! | Body integrity | SHA-512 | hex encoded, 128 chars |
//! | Digest comparison | constant time | `subtle` |
//! | Memory hygiene | volatile zeroing | `zeroize` |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod constant_time;
pub mod error;
pub mod hash;
pub mod secret;

pub use error::CryptoError;
pub use hash::{sha512, sha512_hex};
pub use secret::{SecretBuffer, SecretString};

/// SHA-512 output size in bytes
pub const SHA512_OUTPUT_SIZE: usize = 64;

/// Length of a hex-encoded SHA-512 digest
pub const SHA512_HEX_LEN: usize = SHA512_OUTPUT_SIZE * 2;
