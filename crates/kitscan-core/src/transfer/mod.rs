//! Paged transfer assembly, verification and key extraction.

pub mod aggregator;
pub mod extract;
pub mod session;
pub mod verify;

pub use aggregator::{AggregatorEvent, PageAggregator, Progress, TransferState};
pub use extract::{ArmoredKey, extract_armored_key};
pub use session::{PageRecord, TransferSession};
pub use verify::verify_integrity;
