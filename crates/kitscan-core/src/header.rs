//! Reserved header parsing.
//!
//! Every frame starts with a three byte ASCII header:
//!
//! ```text
//! +---------+-------------------+------------------------
//! | version | page index        | payload ...
//! | 1 hex   | 2 hex, big-endian |
//! +---------+-------------------+------------------------
//!   byte 0    bytes 1-2           bytes 3..
//! ```
//!
//! Hex digits are accepted in either case.

use crate::error::FrameError;
use crate::HEADER_SIZE;

/// Protocol versions understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProtocolVersion {
    /// Multi-frame paged transfer of an armored key
    PagedTransfer = 1,
    /// Single-frame account kit
    AccountKit = 2,
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::PagedTransfer),
            2 => Ok(Self::AccountKit),
            _ => Err(FrameError::UnsupportedVersion(value)),
        }
    }
}

impl ProtocolVersion {
    /// Get raw version number
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Decoded reserved header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedHeader {
    /// Raw protocol version digit
    pub protocol_version: u8,
    /// Page index (0 is the first page)
    pub page_index: u16,
}

impl ReservedHeader {
    /// Parse the header from the start of a frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooShort`] for inputs under three bytes and
    /// [`FrameError::InvalidHeaderByte`] when a header byte is not a hex digit.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        if data.len() < HEADER_SIZE {
            return Err(FrameError::TooShort {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }

        let protocol_version = hex_digit(data, 0)?;
        let page_index = (u16::from(hex_digit(data, 1)?) << 4) | u16::from(hex_digit(data, 2)?);

        Ok(Self {
            protocol_version,
            page_index,
        })
    }

    /// Get the payload following the header.
    #[must_use]
    pub fn payload(data: &[u8]) -> &[u8] {
        data.get(HEADER_SIZE..).unwrap_or_default()
    }

    /// Resolve the version digit against the supported set.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnsupportedVersion`] for unknown versions.
    pub fn version(&self) -> Result<ProtocolVersion, FrameError> {
        ProtocolVersion::try_from(self.protocol_version)
    }

    /// Check if this header addresses the first page.
    #[must_use]
    pub fn is_first_page(&self) -> bool {
        self.page_index == 0
    }

    /// Encode the header as three lowercase ASCII hex bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnsupportedVersion`] if the version needs more
    /// than one digit and [`FrameError::PageIndexOutOfRange`] if the page
    /// index needs more than two.
    pub fn to_bytes(&self) -> Result<[u8; HEADER_SIZE], FrameError> {
        if self.protocol_version > 0x0F {
            return Err(FrameError::UnsupportedVersion(self.protocol_version));
        }
        if self.page_index > 0xFF {
            return Err(FrameError::PageIndexOutOfRange(self.page_index));
        }

        let text = format!("{:x}{:02x}", self.protocol_version, self.page_index);
        let mut out = [0u8; HEADER_SIZE];
        out.copy_from_slice(text.as_bytes());
        Ok(out)
    }
}

fn hex_digit(data: &[u8], position: usize) -> Result<u8, FrameError> {
    let byte = data[position];
    char::from(byte)
        .to_digit(16)
        .map(|d| d as u8)
        .ok_or(FrameError::InvalidHeaderByte { position, byte })
}
