//! Scanner configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::MAX_PAGE_INDEX;

/// How body fragments are joined before hashing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssemblyOrder {
    /// Append fragments in the order they were accepted.
    ///
    /// A user who scans pages out of order produces a body that fails the
    /// hash check and has to restart the transfer.
    #[default]
    ScanOrder,
    /// Place each fragment at the position given by its page index.
    PageIndex,
}

/// Page aggregator and pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Fragment assembly order
    #[serde(default)]
    pub assembly_order: AssemblyOrder,
    /// Verify as soon as every page is scanned (pipeline only)
    #[serde(default = "default_true")]
    pub auto_verify: bool,
    /// Largest page count a first page may declare
    #[serde(default = "default_max_total_pages")]
    pub max_total_pages: u16,
    /// Command channel capacity of the scan pipeline
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_total_pages() -> u16 {
    MAX_PAGE_INDEX + 1
}

fn default_channel_capacity() -> usize {
    32
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            assembly_order: AssemblyOrder::default(),
            auto_verify: true,
            max_total_pages: default_max_total_pages(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl ScannerConfig {
    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a bound is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_total_pages == 0 {
            return Err(Error::Config("max_total_pages must be at least 1".into()));
        }

        if self.channel_capacity == 0 {
            return Err(Error::Config("channel_capacity must be at least 1".into()));
        }

        Ok(())
    }
}
