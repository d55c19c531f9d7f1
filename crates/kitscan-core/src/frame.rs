//! Frame classification.
//!
//! Turns one camera scan outcome into a typed [`Frame`]. Classification is
//! pure and never fails: unrecognized input becomes a user-resolvable issue
//! and decoding errors become a [`Frame::ScanFailure`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use kitscan_crypto::SecretBuffer;
use kitscan_crypto::hash::check_hex_digest_len;

use crate::account_kit::AccountKit;
use crate::error::FrameError;
use crate::header::{ProtocolVersion, ReservedHeader};
use crate::MAX_PAGE_INDEX;

/// Raw result of one barcode scanning attempt
#[derive(PartialEq, Eq)]
pub enum ScanOutcome {
    /// Exactly one barcode decoded; the decoder may not expose raw bytes
    Barcode(Option<Vec<u8>>),
    /// No barcode in the camera frame
    NoBarcode,
    /// Several barcodes in the camera frame at once
    MultipleBarcodes,
    /// Barcode decoder raised an error
    DecoderError(String),
}

impl fmt::Debug for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Barcode(Some(bytes)) => {
                write!(f, "Barcode(Some([REDACTED; {} bytes]))", bytes.len())
            }
            Self::Barcode(None) => f.write_str("Barcode(None)"),
            Self::NoBarcode => f.write_str("NoBarcode"),
            Self::MultipleBarcodes => f.write_str("MultipleBarcodes"),
            Self::DecoderError(cause) => f.debug_tuple("DecoderError").field(cause).finish(),
        }
    }
}

/// Scanning problems the user can fix by moving the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// More than one code in view
    MultipleBarcodesInView,
    /// No code in view
    NoBarcodeInRange,
    /// A code that is not a transfer frame
    NotRecognizedAsProtocolFrame,
}

impl IssueKind {
    /// Short guidance for the user
    #[must_use]
    pub fn guidance(self) -> &'static str {
        match self {
            Self::MultipleBarcodesInView => "only one code at a time",
            Self::NoBarcodeInRange => "center the code",
            Self::NotRecognizedAsProtocolFrame => "this is not an account transfer code",
        }
    }
}

/// Metadata carried by the first page of a paged transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstPageMetadata {
    /// Total pages including the first page
    #[serde(rename = "totalPages", alias = "total_pages")]
    pub total_pages: u16,
    /// Lowercase hex SHA-512 of the concatenated body
    pub hash: String,
    /// Server-side transfer identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<String>,
    /// Server-side user identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Token used to authenticate the transfer with the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_token_id: Option<String>,
    /// Server base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl FirstPageMetadata {
    /// Decode and validate first page metadata.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidFirstPage`] if the payload is not JSON,
    /// declares zero pages, or carries a digest of the wrong length.
    pub fn from_json(payload: &[u8]) -> Result<Self, FrameError> {
        let metadata: Self = serde_json::from_slice(payload).map_err(|err| {
            FrameError::InvalidFirstPage(format!(
                "{:?} error at line {} column {}",
                err.classify(),
                err.line(),
                err.column()
            ))
        })?;

        if metadata.total_pages == 0 {
            return Err(FrameError::InvalidFirstPage("totalPages must be at least 1".into()));
        }

        check_hex_digest_len(&metadata.hash)
            .map_err(|err| FrameError::InvalidFirstPage(err.to_string()))?;

        Ok(metadata)
    }
}

/// Classified protocol frame
#[derive(Debug)]
pub enum Frame {
    /// Page 0 of a paged transfer
    FirstPage {
        /// Protocol version
        version: ProtocolVersion,
        /// Declared page count and digest
        metadata: FirstPageMetadata,
    },
    /// Body page of a paged transfer
    SubsequentPage {
        /// Protocol version
        version: ProtocolVersion,
        /// Page index, at least 1
        page_index: u16,
        /// Body fragment
        payload: SecretBuffer,
    },
    /// Self-contained account kit
    AccountKitPage {
        /// Protocol version
        version: ProtocolVersion,
        /// Page index from the header
        page_index: u16,
        /// Decoded kit
        kit: Box<AccountKit>,
    },
    /// Scan or decode failure
    ScanFailure {
        /// Failure description, free of payload content
        cause: String,
    },
    /// Transient problem the user can resolve
    UserResolvableIssue(IssueKind),
}

impl Frame {
    /// Classify a scan outcome.
    ///
    /// Raw barcode bytes are taken by value and wiped once classified.
    #[must_use]
    pub fn classify(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Barcode(Some(bytes)) => {
                let raw = SecretBuffer::from_vec(bytes);
                Self::from_bytes(raw.as_bytes())
            }
            ScanOutcome::Barcode(None) => {
                Self::UserResolvableIssue(IssueKind::NotRecognizedAsProtocolFrame)
            }
            ScanOutcome::NoBarcode => Self::UserResolvableIssue(IssueKind::NoBarcodeInRange),
            ScanOutcome::MultipleBarcodes => {
                Self::UserResolvableIssue(IssueKind::MultipleBarcodesInView)
            }
            ScanOutcome::DecoderError(cause) => Self::ScanFailure { cause },
        }
    }

    /// Classify the raw bytes of a single barcode.
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        let (header, version) = match ReservedHeader::parse(data)
            .and_then(|header| header.version().map(|version| (header, version)))
        {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(%err, len = data.len(), "not a protocol frame");
                return Self::UserResolvableIssue(IssueKind::NotRecognizedAsProtocolFrame);
            }
        };

        if header.page_index > MAX_PAGE_INDEX {
            debug!(page_index = header.page_index, "page index out of protocol range");
            return Self::UserResolvableIssue(IssueKind::NotRecognizedAsProtocolFrame);
        }

        let payload = ReservedHeader::payload(data);

        match version {
            ProtocolVersion::PagedTransfer if header.is_first_page() => {
                match FirstPageMetadata::from_json(payload) {
                    Ok(metadata) => Self::FirstPage { version, metadata },
                    Err(err) => Self::ScanFailure {
                        cause: err.to_string(),
                    },
                }
            }
            ProtocolVersion::PagedTransfer => Self::SubsequentPage {
                version,
                page_index: header.page_index,
                payload: SecretBuffer::from(payload),
            },
            ProtocolVersion::AccountKit => match AccountKit::from_json(payload) {
                Ok(kit) => Self::AccountKitPage {
                    version,
                    page_index: header.page_index,
                    kit: Box::new(kit),
                },
                Err(err) => Self::ScanFailure {
                    cause: err.to_string(),
                },
            },
        }
    }

    /// Get the page index for protocol frames
    #[must_use]
    pub fn page_index(&self) -> Option<u16> {
        match self {
            Self::FirstPage { .. } => Some(0),
            Self::SubsequentPage { page_index, .. } | Self::AccountKitPage { page_index, .. } => {
                Some(*page_index)
            }
            Self::ScanFailure { .. } | Self::UserResolvableIssue(_) => None,
        }
    }

    /// Get the protocol version for protocol frames
    #[must_use]
    pub fn version(&self) -> Option<ProtocolVersion> {
        match self {
            Self::FirstPage { version, .. }
            | Self::SubsequentPage { version, .. }
            | Self::AccountKitPage { version, .. } => Some(*version),
            Self::ScanFailure { .. } | Self::UserResolvableIssue(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitscan_crypto::sha512_hex;

    fn first_page(total_pages: u16, body: &[u8]) -> Vec<u8> {
        let mut frame = b"100".to_vec();
        frame.extend_from_slice(
            format!(
                r#"{{"totalPages":{total_pages},"hash":"{}"}}"#,
                sha512_hex(body)
            )
            .as_bytes(),
        );
        frame
    }

    #[test]
    fn test_classify_first_page() {
        let frame = Frame::from_bytes(&first_page(3, b"abcdef"));
        match frame {
            Frame::FirstPage { version, metadata } => {
                assert_eq!(version, ProtocolVersion::PagedTransfer);
                assert_eq!(metadata.total_pages, 3);
                assert_eq!(metadata.hash, sha512_hex(b"abcdef"));
                assert!(metadata.domain.is_none());
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_classify_first_page_snake_case_alias() {
        let mut bytes = b"100".to_vec();
        bytes.extend_from_slice(
            format!(
                r#"{{"total_pages":2,"hash":"{}","domain":"https://d","transfer_id":"t1"}}"#,
                sha512_hex(b"x")
            )
            .as_bytes(),
        );

        let Frame::FirstPage { metadata, .. } = Frame::from_bytes(&bytes) else {
            panic!("expected first page");
        };
        assert_eq!(metadata.total_pages, 2);
        assert_eq!(metadata.domain.as_deref(), Some("https://d"));
        assert_eq!(metadata.transfer_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_classify_subsequent_page() {
        let frame = Frame::from_bytes(b"101abc");
        assert_eq!(frame.page_index(), Some(1));
        assert_eq!(frame.version(), Some(ProtocolVersion::PagedTransfer));

        let Frame::SubsequentPage { payload, .. } = frame else {
            panic!("expected subsequent page");
        };
        assert_eq!(payload.as_bytes(), b"abc");
    }

    #[test]
    fn test_unsupported_version_not_recognized() {
        for bytes in [&b"901abc"[..], b"001abc", b"f00{}"] {
            assert!(matches!(
                Frame::from_bytes(bytes),
                Frame::UserResolvableIssue(IssueKind::NotRecognizedAsProtocolFrame)
            ));
        }
    }

    #[test]
    fn test_short_or_garbage_not_recognized() {
        for bytes in [&b""[..], b"1", b"10", b"https://example.com"] {
            assert!(matches!(
                Frame::from_bytes(bytes),
                Frame::UserResolvableIssue(IssueKind::NotRecognizedAsProtocolFrame)
            ));
        }
    }

    #[test]
    fn test_bad_first_page_is_scan_failure() {
        let frame = Frame::from_bytes(b"100{not json");
        assert!(matches!(frame, Frame::ScanFailure { .. }));

        let zero_pages = format!(r#"100{{"totalPages":0,"hash":"{}"}}"#, sha512_hex(b""));
        assert!(matches!(
            Frame::from_bytes(zero_pages.as_bytes()),
            Frame::ScanFailure { .. }
        ));

        let short_hash = Frame::from_bytes(br#"100{"totalPages":2,"hash":"abcd"}"#);
        let Frame::ScanFailure { cause } = short_hash else {
            panic!("expected scan failure");
        };
        assert!(cause.contains("digest length"));
    }

    #[test]
    fn test_classify_account_kit() {
        let frame = Frame::from_bytes(
            br#"200{"domain":"https://d","user_id":"u","user_private_armored_key":"KEY"}"#,
        );
        let Frame::AccountKitPage { version, kit, .. } = frame else {
            panic!("expected account kit");
        };
        assert_eq!(version, ProtocolVersion::AccountKit);
        assert_eq!(kit.private_key(), "KEY");
    }

    #[test]
    fn test_bad_account_kit_is_scan_failure() {
        assert!(matches!(
            Frame::from_bytes(b"200[]"),
            Frame::ScanFailure { .. }
        ));
    }

    #[test]
    fn test_classify_camera_outcomes() {
        assert!(matches!(
            Frame::classify(ScanOutcome::NoBarcode),
            Frame::UserResolvableIssue(IssueKind::NoBarcodeInRange)
        ));
        assert!(matches!(
            Frame::classify(ScanOutcome::MultipleBarcodes),
            Frame::UserResolvableIssue(IssueKind::MultipleBarcodesInView)
        ));
        assert!(matches!(
            Frame::classify(ScanOutcome::Barcode(None)),
            Frame::UserResolvableIssue(IssueKind::NotRecognizedAsProtocolFrame)
        ));

        let Frame::ScanFailure { cause } =
            Frame::classify(ScanOutcome::DecoderError("camera closed".into()))
        else {
            panic!("expected scan failure");
        };
        assert_eq!(cause, "camera closed");

        assert_eq!(
            Frame::classify(ScanOutcome::Barcode(Some(b"102def".to_vec()))).page_index(),
            Some(2)
        );
    }

    #[test]
    fn test_scan_outcome_debug_redacts_bytes() {
        let outcome = ScanOutcome::Barcode(Some(b"100SECRETPAYLOAD".to_vec()));
        let rendered = format!("{outcome:?}");
        assert_eq!(rendered, "Barcode(Some([REDACTED; 16 bytes]))");
        assert!(!rendered.contains("SECRET"));

        assert_eq!(format!("{:?}", ScanOutcome::Barcode(None)), "Barcode(None)");
        assert_eq!(
            format!("{:?}", ScanOutcome::DecoderError("camera closed".into())),
            "DecoderError(\"camera closed\")"
        );
    }

    #[test]
    fn test_issue_guidance() {
        assert_eq!(IssueKind::NoBarcodeInRange.guidance(), "center the code");
        assert_eq!(
            IssueKind::MultipleBarcodesInView.guidance(),
            "only one code at a time"
        );
    }
}
