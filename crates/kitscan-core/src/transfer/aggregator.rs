//! Page aggregator state machine.
//!
//! ```text
//!            FirstPage                  verify() ok
//!   Idle ─────────────────▶ Receiving ─────────────▶ Completed
//!    │ ▲                      │   │
//!    │ └──── reset() ─────────┘   └─ verify() err / violation ─▶ Failed
//!    │
//!    └─ AccountKitPage ─▶ Completed
//! ```
//!
//! `reset()` returns to `Idle` from every state and wipes the session.
//! The aggregator never verifies on its own; the caller decides when.

use tracing::{debug, info, warn};

use crate::account_kit::AccountKit;
use crate::config::ScannerConfig;
use crate::error::TransferError;
use crate::frame::{FirstPageMetadata, Frame, IssueKind};
use crate::header::ProtocolVersion;
use crate::transfer::extract::{ArmoredKey, extract_armored_key};
use crate::transfer::session::{PageRecord, TransferSession};
use crate::transfer::verify::verify_integrity;

/// Aggregator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// No transfer in progress, waiting for a first page
    Idle,
    /// First page accepted, collecting body pages
    Receiving,
    /// Transfer finished successfully
    Completed,
    /// Transfer aborted or failed verification
    Failed,
}

/// Scan progress of a paged transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Page that was just accepted
    pub page_index: u16,
    /// Pages scanned so far, first page included
    pub scanned: usize,
    /// Pages declared by the first page
    pub total_pages: u16,
}

impl Progress {
    /// Check if every page has been scanned
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.scanned == usize::from(self.total_pages)
    }
}

/// Outcome of accepting one frame
#[derive(Debug)]
pub enum AggregatorEvent {
    /// First page accepted, transfer started
    Started {
        /// First page metadata
        metadata: FirstPageMetadata,
        /// Progress after the first page
        progress: Progress,
    },
    /// Body page accepted
    PageAccepted(Progress),
    /// Page was already scanned and has been ignored
    Duplicate {
        /// Re-scanned page
        page_index: u16,
    },
    /// Transient scanning issue
    Issue(IssueKind),
    /// Frame could not be decoded
    ScanFailed {
        /// Failure description
        cause: String,
    },
    /// Account kit received; the transfer is complete
    AccountKit(Box<AccountKit>),
    /// Frame rejected by the protocol rules
    Failed(TransferError),
}

impl AggregatorEvent {
    /// Get progress carried by the event
    #[must_use]
    pub fn progress(&self) -> Option<Progress> {
        match self {
            Self::Started { progress, .. } | Self::PageAccepted(progress) => Some(*progress),
            _ => None,
        }
    }
}

/// Page aggregator
///
/// Owns at most one [`TransferSession`]. All mutation goes through `&mut self`,
/// so a verification can never overlap another call.
pub struct PageAggregator {
    config: ScannerConfig,
    state: TransferState,
    session: Option<TransferSession>,
}

impl PageAggregator {
    /// Create an idle aggregator
    #[must_use]
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            state: TransferState::Idle,
            session: None,
        }
    }

    /// Get current state
    #[must_use]
    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Get the active session
    #[must_use]
    pub fn session(&self) -> Option<&TransferSession> {
        self.session.as_ref()
    }

    /// Get configuration
    #[must_use]
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Check if the transfer has finished, successfully or not
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(self.state, TransferState::Completed | TransferState::Failed)
    }

    /// Check if the active session has every page
    #[must_use]
    pub fn is_ready_to_verify(&self) -> bool {
        self.state == TransferState::Receiving
            && self.session.as_ref().is_some_and(TransferSession::is_complete)
    }

    /// Accept one classified frame.
    pub fn accept(&mut self, frame: Frame) -> AggregatorEvent {
        match frame {
            Frame::UserResolvableIssue(kind) => {
                debug!(?kind, "scan issue");
                AggregatorEvent::Issue(kind)
            }
            Frame::ScanFailure { cause } => {
                warn!(%cause, "scan failure");
                AggregatorEvent::ScanFailed { cause }
            }
            _ if self.is_terminated() => {
                debug!(state = ?self.state, "frame after transfer end ignored");
                AggregatorEvent::Failed(TransferError::Terminated)
            }
            Frame::FirstPage { version, metadata } => self.accept_first_page(version, metadata),
            Frame::SubsequentPage {
                page_index,
                payload,
                ..
            } => self.accept_page(page_index, payload.as_bytes()),
            Frame::AccountKitPage { kit, .. } => self.accept_account_kit(kit),
        }
    }

    fn accept_first_page(
        &mut self,
        version: ProtocolVersion,
        metadata: FirstPageMetadata,
    ) -> AggregatorEvent {
        if let Some(session) = &self.session {
            if *session.metadata() != metadata {
                warn!("first page re-scanned with different metadata, ignored");
            }
            return AggregatorEvent::Duplicate { page_index: 0 };
        }

        if metadata.total_pages > self.config.max_total_pages {
            warn!(
                declared = metadata.total_pages,
                limit = self.config.max_total_pages,
                "first page rejected"
            );
            return AggregatorEvent::Failed(TransferError::TooManyPages {
                declared: metadata.total_pages,
                limit: self.config.max_total_pages,
            });
        }

        let session = TransferSession::new(version, metadata.clone(), self.config.assembly_order);
        info!(
            version = session.version().as_u8(),
            order = ?session.assembly_order(),
            total_pages = session.total_pages(),
            "transfer started"
        );
        let progress = Progress {
            page_index: 0,
            scanned: session.scanned_count(),
            total_pages: session.total_pages(),
        };
        self.session = Some(session);
        self.state = TransferState::Receiving;

        AggregatorEvent::Started { metadata, progress }
    }

    fn accept_page(&mut self, page_index: u16, payload: &[u8]) -> AggregatorEvent {
        let Some(session) = self.session.as_mut() else {
            warn!(page_index, "body page before first page");
            return AggregatorEvent::Failed(TransferError::FirstPageNotScanned);
        };

        match session.record_page(page_index, payload) {
            PageRecord::Accepted => {
                let progress = Progress {
                    page_index,
                    scanned: session.scanned_count(),
                    total_pages: session.total_pages(),
                };
                debug!(
                    page_index,
                    scanned = progress.scanned,
                    total = progress.total_pages,
                    "page accepted"
                );
                AggregatorEvent::PageAccepted(progress)
            }
            PageRecord::Duplicate => {
                debug!(page_index, "duplicate page ignored");
                AggregatorEvent::Duplicate { page_index }
            }
            PageRecord::OutOfRange => {
                let total_pages = session.total_pages();
                AggregatorEvent::Failed(self.abort(TransferError::PageOutOfRange {
                    page_index,
                    total_pages,
                }))
            }
        }
    }

    fn accept_account_kit(&mut self, kit: Box<AccountKit>) -> AggregatorEvent {
        if self.session.is_some() {
            return AggregatorEvent::Failed(self.abort(TransferError::UnexpectedAccountKit));
        }

        info!(domain = %kit.domain, "account kit received");
        self.state = TransferState::Completed;
        AggregatorEvent::AccountKit(kit)
    }

    /// Verify the assembled body and extract the armored key.
    ///
    /// On success or verification failure the session is wiped and the
    /// transfer terminates. Calling before every page is scanned returns
    /// [`TransferError::Incomplete`] and leaves the session untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::NoSession`] when idle, [`TransferError::Terminated`]
    /// after the transfer ended, [`TransferError::Incomplete`] while pages are
    /// missing, and [`TransferError::HashMismatch`] or
    /// [`TransferError::MalformedPayload`] when the body is rejected.
    pub fn verify(&mut self) -> Result<ArmoredKey, TransferError> {
        match self.state {
            TransferState::Idle => return Err(TransferError::NoSession),
            TransferState::Completed | TransferState::Failed => {
                return Err(TransferError::Terminated);
            }
            TransferState::Receiving => {}
        }

        let session = self.session.as_ref().ok_or(TransferError::NoSession)?;
        if !session.is_complete() {
            return Err(TransferError::Incomplete {
                scanned: session.scanned_count(),
                total_pages: session.total_pages(),
            });
        }

        let mut session = self.session.take().ok_or(TransferError::NoSession)?;
        let result = verify_integrity(session.accumulated_bytes(), session.declared_hash())
            .and_then(|()| extract_armored_key(session.accumulated_bytes()));
        session.erase();

        match &result {
            Ok(key) => {
                info!(
                    key_len = key.len(),
                    elapsed_ms = session.elapsed().as_millis() as u64,
                    "transfer verified"
                );
                self.state = TransferState::Completed;
            }
            Err(err) => {
                warn!(%err, "transfer verification failed");
                self.state = TransferState::Failed;
            }
        }

        result
    }

    /// Cancel any transfer and return to idle, wiping the session.
    pub fn reset(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.erase();
            debug!(scanned = session.scanned_count(), "transfer session discarded");
        }
        self.state = TransferState::Idle;
    }

    fn abort(&mut self, err: TransferError) -> TransferError {
        warn!(%err, "transfer aborted");
        if let Some(mut session) = self.session.take() {
            session.erase();
        }
        self.state = TransferState::Failed;
        err
    }
}

impl Default for PageAggregator {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssemblyOrder;
    use kitscan_crypto::sha512_hex;

    fn first_page(total_pages: u16, body: &[u8]) -> Frame {
        Frame::from_bytes(
            format!(
                r#"100{{"totalPages":{total_pages},"hash":"{}"}}"#,
                sha512_hex(body)
            )
            .as_bytes(),
        )
    }

    fn page(index: u16, payload: &[u8]) -> Frame {
        let mut bytes = format!("1{index:02x}").into_bytes();
        bytes.extend_from_slice(payload);
        Frame::from_bytes(&bytes)
    }

    #[test]
    fn test_first_page_starts_session() {
        let mut aggregator = PageAggregator::default();
        let event = aggregator.accept(first_page(3, b"abcdef"));

        let Some(progress) = event.progress() else {
            panic!("expected progress, got {event:?}");
        };
        assert_eq!(progress.scanned, 1);
        assert_eq!(progress.total_pages, 3);
        assert_eq!(aggregator.state(), TransferState::Receiving);

        let session = aggregator.session().unwrap();
        assert_eq!(session.version(), ProtocolVersion::PagedTransfer);
        assert_eq!(session.assembly_order(), AssemblyOrder::ScanOrder);
    }

    #[test]
    fn test_body_page_before_first_page() {
        let mut aggregator = PageAggregator::default();
        let event = aggregator.accept(page(1, b"abc"));

        assert!(matches!(
            event,
            AggregatorEvent::Failed(TransferError::FirstPageNotScanned)
        ));
        assert_eq!(aggregator.state(), TransferState::Idle);
        assert!(aggregator.session().is_none());
    }

    #[test]
    fn test_scenario_ascending_order_verifies() {
        let body = br#"{"armored_key":"KEYDATA"}"#;
        let mut aggregator = PageAggregator::default();
        aggregator.accept(first_page(3, body));
        aggregator.accept(page(1, &body[..10]));
        let event = aggregator.accept(page(2, &body[10..]));

        assert!(event.progress().unwrap().is_complete());
        assert!(aggregator.is_ready_to_verify());

        let key = aggregator.verify().unwrap();
        assert_eq!(key.expose_secret(), "KEYDATA");
        assert_eq!(aggregator.state(), TransferState::Completed);
        assert!(aggregator.session().is_none());
    }

    #[test]
    fn test_scenario_reversed_order_mismatch() {
        let mut aggregator = PageAggregator::default();
        aggregator.accept(first_page(3, b"abcdef"));
        aggregator.accept(page(2, b"def"));
        aggregator.accept(page(1, b"abc"));

        assert_eq!(aggregator.verify().unwrap_err(), TransferError::HashMismatch);
        assert_eq!(aggregator.state(), TransferState::Failed);
        assert!(aggregator.session().is_none());
    }

    #[test]
    fn test_page_index_order_tolerates_reversed_scan() {
        let config = ScannerConfig {
            assembly_order: AssemblyOrder::PageIndex,
            ..ScannerConfig::default()
        };
        let body = br#"{"armored_key":"KEYDATA"}"#;
        let mut aggregator = PageAggregator::new(config);
        aggregator.accept(first_page(3, body));
        assert_eq!(
            aggregator.session().unwrap().assembly_order(),
            AssemblyOrder::PageIndex
        );
        aggregator.accept(page(2, &body[10..]));
        aggregator.accept(page(1, &body[..10]));

        assert_eq!(aggregator.verify().unwrap().expose_secret(), "KEYDATA");
    }

    #[test]
    fn test_duplicates_are_idempotent() {
        let mut aggregator = PageAggregator::default();
        aggregator.accept(first_page(3, b"abcdef"));
        aggregator.accept(page(1, b"abc"));

        assert!(matches!(
            aggregator.accept(page(1, b"zzz")),
            AggregatorEvent::Duplicate { page_index: 1 }
        ));
        assert!(matches!(
            aggregator.accept(first_page(9, b"other")),
            AggregatorEvent::Duplicate { page_index: 0 }
        ));

        let session = aggregator.session().unwrap();
        assert_eq!(session.accumulated_bytes(), b"abc");
        assert_eq!(session.scanned_count(), 2);
        assert_eq!(session.total_pages(), 3);
    }

    #[test]
    fn test_verify_incomplete_keeps_session() {
        let mut aggregator = PageAggregator::default();
        aggregator.accept(first_page(3, b"abc"));
        aggregator.accept(page(1, b"abc"));

        assert_eq!(
            aggregator.verify().unwrap_err(),
            TransferError::Incomplete {
                scanned: 2,
                total_pages: 3
            }
        );
        assert_eq!(aggregator.state(), TransferState::Receiving);
        assert_eq!(aggregator.session().unwrap().accumulated_len(), 3);
    }

    #[test]
    fn test_verify_without_session() {
        let mut aggregator = PageAggregator::default();
        assert_eq!(aggregator.verify().unwrap_err(), TransferError::NoSession);
    }

    #[test]
    fn test_out_of_range_page_aborts() {
        let mut aggregator = PageAggregator::default();
        aggregator.accept(first_page(2, b"abc"));
        aggregator.accept(page(1, b"abc"));

        let event = aggregator.accept(page(5, b"def"));
        assert!(matches!(
            event,
            AggregatorEvent::Failed(TransferError::PageOutOfRange {
                page_index: 5,
                total_pages: 2
            })
        ));
        assert_eq!(aggregator.state(), TransferState::Failed);
        assert!(aggregator.session().is_none());
    }

    #[test]
    fn test_frames_after_termination_rejected() {
        let mut aggregator = PageAggregator::default();
        aggregator.accept(first_page(2, b"abc"));
        aggregator.accept(page(1, b"xyz"));
        assert!(aggregator.verify().is_err());

        assert!(matches!(
            aggregator.accept(first_page(2, b"abc")),
            AggregatorEvent::Failed(TransferError::Terminated)
        ));
        assert_eq!(aggregator.verify().unwrap_err(), TransferError::Terminated);

        aggregator.reset();
        assert_eq!(aggregator.state(), TransferState::Idle);
        assert!(aggregator.accept(first_page(2, b"abc")).progress().is_some());
    }

    #[test]
    fn test_reset_discards_session() {
        let mut aggregator = PageAggregator::default();
        aggregator.accept(first_page(3, b"abc"));
        aggregator.accept(page(1, b"abc"));

        aggregator.reset();
        assert_eq!(aggregator.state(), TransferState::Idle);
        assert!(aggregator.session().is_none());
        assert!(matches!(
            aggregator.accept(page(2, b"def")),
            AggregatorEvent::Failed(TransferError::FirstPageNotScanned)
        ));
    }

    #[test]
    fn test_account_kit_completes() {
        let mut aggregator = PageAggregator::default();
        let kit = Frame::from_bytes(
            br#"200{"domain":"https://d","user_id":"u","user_private_armored_key":"KEY"}"#,
        );

        let AggregatorEvent::AccountKit(kit) = aggregator.accept(kit) else {
            panic!("expected account kit");
        };
        assert_eq!(kit.private_key(), "KEY");
        assert_eq!(aggregator.state(), TransferState::Completed);
    }

    #[test]
    fn test_account_kit_during_paged_transfer_aborts() {
        let mut aggregator = PageAggregator::default();
        aggregator.accept(first_page(3, b"abc"));

        let kit = Frame::from_bytes(
            br#"200{"domain":"https://d","user_id":"u","user_private_armored_key":"KEY"}"#,
        );
        assert!(matches!(
            aggregator.accept(kit),
            AggregatorEvent::Failed(TransferError::UnexpectedAccountKit)
        ));
        assert_eq!(aggregator.state(), TransferState::Failed);
    }

    #[test]
    fn test_too_many_pages_rejected() {
        let config = ScannerConfig {
            max_total_pages: 4,
            ..ScannerConfig::default()
        };
        let mut aggregator = PageAggregator::new(config);

        assert!(matches!(
            aggregator.accept(first_page(5, b"abc")),
            AggregatorEvent::Failed(TransferError::TooManyPages {
                declared: 5,
                limit: 4
            })
        ));
        assert_eq!(aggregator.state(), TransferState::Idle);
    }

    #[test]
    fn test_issues_do_not_change_state() {
        let mut aggregator = PageAggregator::default();
        aggregator.accept(first_page(3, b"abc"));

        assert!(matches!(
            aggregator.accept(Frame::from_bytes(b"901abc")),
            AggregatorEvent::Issue(IssueKind::NotRecognizedAsProtocolFrame)
        ));
        assert!(matches!(
            aggregator.accept(Frame::from_bytes(b"100{broken")),
            AggregatorEvent::ScanFailed { .. }
        ));
        assert_eq!(aggregator.state(), TransferState::Receiving);
        assert_eq!(aggregator.session().unwrap().scanned_count(), 1);
    }
}
