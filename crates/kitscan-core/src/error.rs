//! Error types for the KITSCAN protocol engine.

use thiserror::Error;

/// Core engine errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid scanner configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Frame-level errors
///
/// These never reach the caller of the classifier directly: they are
/// folded into a user-resolvable issue or a scan failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Frame too short to hold the reserved header
    #[error("frame too short: expected at least {expected}, got {actual}")]
    TooShort {
        /// Expected minimum size
        expected: usize,
        /// Actual size received
        actual: usize,
    },

    /// Header byte is not an ASCII hex digit
    #[error("invalid header byte 0x{byte:02X} at position {position}")]
    InvalidHeaderByte {
        /// Offset within the header
        position: usize,
        /// Offending byte
        byte: u8,
    },

    /// Protocol version outside the supported set
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Page index outside the protocol range
    #[error("page index out of range: {0}")]
    PageIndexOutOfRange(u16),

    /// First page metadata could not be decoded
    #[error("invalid first page: {0}")]
    InvalidFirstPage(String),

    /// Account kit content could not be decoded
    #[error("invalid account kit: {0}")]
    InvalidAccountKit(String),
}

/// Transfer-level errors raised by the page aggregator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    /// Body page received before the first page
    #[error("first page not yet scanned")]
    FirstPageNotScanned,

    /// No transfer in progress
    #[error("no transfer in progress")]
    NoSession,

    /// Transfer already finished; a reset is required
    #[error("transfer already terminated, reset required")]
    Terminated,

    /// Verification requested before every page was scanned
    #[error("transfer incomplete: {scanned} of {total_pages} pages scanned")]
    Incomplete {
        /// Pages scanned so far (first page included)
        scanned: usize,
        /// Pages declared by the first page
        total_pages: u16,
    },

    /// First page declares more pages than allowed
    #[error("first page declares {declared} pages, limit is {limit}")]
    TooManyPages {
        /// Declared page count
        declared: u16,
        /// Configured limit
        limit: u16,
    },

    /// Body page index beyond the declared page count
    #[error("page {page_index} out of range for {total_pages} pages")]
    PageOutOfRange {
        /// Index carried by the frame
        page_index: u16,
        /// Pages declared by the first page
        total_pages: u16,
    },

    /// Account kit frame scanned during a paged transfer
    #[error("account kit scanned during a paged transfer")]
    UnexpectedAccountKit,

    /// Body digest does not match the declared hash
    #[error("hash mismatch")]
    HashMismatch,

    /// Verified body does not contain an armored key
    #[error("malformed payload")]
    MalformedPayload,
}

impl TransferError {
    /// Check if the error ended the transfer.
    ///
    /// Non-terminal errors leave the aggregator state untouched, so scanning
    /// can simply continue.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::PageOutOfRange { .. }
                | Self::UnexpectedAccountKit
                | Self::HashMismatch
                | Self::MalformedPayload
        )
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;
