//! # KITSCAN Core
//!
//! Protocol engine for transferring an account's armored private key from one
//! device to another through a sequence of scanned QR codes.
//!
//! This crate provides:
//! - Reserved header parsing (version digit, two hex digits of page index)
//! - Frame classification of camera scan outcomes
//! - Page aggregation with duplicate suppression and completeness tracking
//! - SHA-512 integrity verification of the assembled body
//! - Armored key extraction into wipe-on-drop storage
//! - An async pipeline that serializes scans and verification
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        ScanPipeline                              │
//! │   (one task, commands in, reports out)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                        PageAggregator                            │
//! │   (Idle → Receiving → Completed | Failed, verify, extract)      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                        Frame                                     │
//! │   (reserved header + first page / body page / account kit)      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Frame Format
//!
//! ```text
//! ┌─────────┬────────────────┬──────────────────────────────┐
//! │ version │ page index     │ payload                      │
//! │ 1 hex   │ 2 hex          │ JSON (page 0) or body bytes  │
//! └─────────┴────────────────┴──────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod account_kit;
pub mod config;
pub mod error;
pub mod frame;
pub mod header;
pub mod pipeline;
pub mod transfer;

pub use account_kit::{AccountKit, SecurityToken};
pub use config::{AssemblyOrder, ScannerConfig};
pub use error::{Error, FrameError, TransferError};
pub use frame::{FirstPageMetadata, Frame, IssueKind, ScanOutcome};
pub use header::{ProtocolVersion, ReservedHeader};
pub use pipeline::{ScanCommand, ScanPipeline, ScanReport};
pub use transfer::{
    AggregatorEvent, ArmoredKey, PageAggregator, Progress, TransferSession, TransferState,
};

/// Reserved header size in bytes
pub const HEADER_SIZE: usize = 3;

/// Largest page index the protocol admits
pub const MAX_PAGE_INDEX: u16 = 32767;

/// Marker preceding the armored key in a transfer body
pub const ARMORED_KEY_MARKER: &[u8] = br#""armored_key":""#;
