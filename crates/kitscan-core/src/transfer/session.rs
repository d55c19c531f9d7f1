//! Transfer session state for one paged transfer.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use kitscan_crypto::SecretBuffer;

use crate::config::AssemblyOrder;
use crate::frame::FirstPageMetadata;
use crate::header::ProtocolVersion;

/// Result of recording a body page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRecord {
    /// Page was new and its fragment was added to the body
    Accepted,
    /// Page was already scanned; nothing changed
    Duplicate,
    /// Page index is not below the declared page count; nothing changed
    OutOfRange,
}

/// Transfer session
///
/// Created when a first page is accepted. Tracks which pages have been
/// scanned and accumulates body fragments in a wipe-on-drop buffer.
pub struct TransferSession {
    version: ProtocolVersion,
    metadata: FirstPageMetadata,
    order: AssemblyOrder,

    /// Scanned page indices, first page included
    scanned_pages: HashSet<u16>,
    /// `(page_index, fragment_len)` sorted by page index, for `PageIndex` order
    fragments: Vec<(u16, usize)>,
    /// Concatenated body fragments
    accumulated: SecretBuffer,

    started_at: Instant,
}

impl TransferSession {
    /// Create a session from an accepted first page
    #[must_use]
    pub fn new(version: ProtocolVersion, metadata: FirstPageMetadata, order: AssemblyOrder) -> Self {
        Self {
            version,
            metadata,
            order,
            scanned_pages: HashSet::from([0]),
            fragments: Vec::new(),
            accumulated: SecretBuffer::new(),
            started_at: Instant::now(),
        }
    }

    /// Record a body page.
    pub fn record_page(&mut self, page_index: u16, payload: &[u8]) -> PageRecord {
        if page_index >= self.metadata.total_pages {
            return PageRecord::OutOfRange;
        }

        if !self.scanned_pages.insert(page_index) {
            return PageRecord::Duplicate;
        }

        match self.order {
            AssemblyOrder::ScanOrder => self.accumulated.extend_from_slice(payload),
            AssemblyOrder::PageIndex => {
                let pos = self
                    .fragments
                    .partition_point(|&(index, _)| index < page_index);
                let offset = self.fragments[..pos].iter().map(|&(_, len)| len).sum();
                self.accumulated.insert_slice(offset, payload);
                self.fragments.insert(pos, (page_index, payload.len()));
            }
        }

        PageRecord::Accepted
    }

    /// Get protocol version
    #[must_use]
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Get first page metadata
    #[must_use]
    pub fn metadata(&self) -> &FirstPageMetadata {
        &self.metadata
    }

    /// Get declared page count
    #[must_use]
    pub fn total_pages(&self) -> u16 {
        self.metadata.total_pages
    }

    /// Get declared body digest
    #[must_use]
    pub fn declared_hash(&self) -> &str {
        &self.metadata.hash
    }

    /// Get assembly order
    #[must_use]
    pub fn assembly_order(&self) -> AssemblyOrder {
        self.order
    }

    /// Check whether a page has been scanned
    #[must_use]
    pub fn is_scanned(&self, page_index: u16) -> bool {
        self.scanned_pages.contains(&page_index)
    }

    /// Get number of scanned pages, first page included
    #[must_use]
    pub fn scanned_count(&self) -> usize {
        self.scanned_pages.len()
    }

    /// Get missing page indices in ascending order
    #[must_use]
    pub fn missing_pages(&self) -> Vec<u16> {
        (0..self.metadata.total_pages)
            .filter(|i| !self.scanned_pages.contains(i))
            .collect()
    }

    /// Check if every declared page has been scanned
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.scanned_pages.len() == usize::from(self.metadata.total_pages)
    }

    /// Get scan progress (0.0 to 1.0)
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.scanned_pages.len() as f64 / f64::from(self.metadata.total_pages)
    }

    /// Get accumulated body length
    #[must_use]
    pub fn accumulated_len(&self) -> usize {
        self.accumulated.len()
    }

    /// Borrow the accumulated body
    #[must_use]
    pub fn accumulated_bytes(&self) -> &[u8] {
        self.accumulated.as_bytes()
    }

    /// Get time since the first page was accepted
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Wipe the accumulated body
    pub fn erase(&mut self) {
        self.accumulated.clear();
        self.fragments.clear();
    }
}
