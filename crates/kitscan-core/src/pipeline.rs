//! Async scan pipeline.
//!
//! Camera callbacks push [`ScanCommand`]s into a bounded channel. A single
//! task owns the [`PageAggregator`] and handles commands one at a time, so a
//! verification never overlaps another scan. Reports flow back on a second
//! channel.
//!
//! ```text
//!   camera ──ScanCommand──▶ [ ScanPipeline task ] ──ScanReport──▶ UI
//! ```

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ScannerConfig;
use crate::error::TransferError;
use crate::frame::{Frame, ScanOutcome};
use crate::transfer::{AggregatorEvent, ArmoredKey, PageAggregator, TransferState};

/// Input to the scan pipeline
#[derive(Debug)]
pub enum ScanCommand {
    /// One camera scan outcome
    Scan(ScanOutcome),
    /// Verify the assembled transfer now
    Verify,
    /// Cancel the transfer and start over
    Reset,
}

/// Output of the scan pipeline
#[derive(Debug)]
pub enum ScanReport {
    /// Aggregator reaction to a scanned frame
    Event(AggregatorEvent),
    /// Transfer verified; the key is ready for import
    Verified(ArmoredKey),
    /// Verification was refused or failed
    VerifyFailed(TransferError),
    /// Pipeline returned to idle
    Reset,
}

/// Sequential scan pipeline
pub struct ScanPipeline {
    aggregator: PageAggregator,
    auto_verify: bool,
}

impl ScanPipeline {
    /// Create a pipeline
    #[must_use]
    pub fn new(config: ScannerConfig) -> Self {
        let auto_verify = config.auto_verify;
        Self {
            aggregator: PageAggregator::new(config),
            auto_verify,
        }
    }

    /// Create command and report channels sized by the configuration.
    #[must_use]
    pub fn channel(
        config: &ScannerConfig,
    ) -> (
        (mpsc::Sender<ScanCommand>, mpsc::Receiver<ScanCommand>),
        (mpsc::Sender<ScanReport>, mpsc::Receiver<ScanReport>),
    ) {
        (
            mpsc::channel(config.channel_capacity),
            mpsc::channel(config.channel_capacity),
        )
    }

    /// Get the aggregator
    #[must_use]
    pub fn aggregator(&self) -> &PageAggregator {
        &self.aggregator
    }

    /// Get aggregator state
    #[must_use]
    pub fn state(&self) -> TransferState {
        self.aggregator.state()
    }

    /// Handle one command and return the resulting reports.
    pub fn handle(&mut self, command: ScanCommand) -> Vec<ScanReport> {
        match command {
            ScanCommand::Scan(outcome) => {
                let event = self.aggregator.accept(Frame::classify(outcome));
                let mut reports = vec![ScanReport::Event(event)];

                if self.auto_verify && self.aggregator.is_ready_to_verify() {
                    debug!("all pages scanned, verifying");
                    reports.push(self.verify());
                }

                reports
            }
            ScanCommand::Verify => vec![self.verify()],
            ScanCommand::Reset => {
                self.aggregator.reset();
                vec![ScanReport::Reset]
            }
        }
    }

    fn verify(&mut self) -> ScanReport {
        match self.aggregator.verify() {
            Ok(key) => ScanReport::Verified(key),
            Err(err) => ScanReport::VerifyFailed(err),
        }
    }

    /// Run until the command channel closes or the report receiver is dropped.
    ///
    /// Any unfinished transfer is wiped on exit.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<ScanCommand>,
        reports: mpsc::Sender<ScanReport>,
    ) {
        info!("scan pipeline started");

        'commands: while let Some(command) = commands.recv().await {
            for report in self.handle(command) {
                if reports.send(report).await.is_err() {
                    debug!("report receiver dropped");
                    break 'commands;
                }
            }
        }

        self.aggregator.reset();
        info!("scan pipeline stopped");
    }

    /// Spawn the pipeline on the current tokio runtime.
    pub fn spawn(
        self,
        commands: mpsc::Receiver<ScanCommand>,
        reports: mpsc::Sender<ScanReport>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(commands, reports))
    }
}

impl Default for ScanPipeline {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}
