//! KITSCAN CLI
//!
//! Replays captured camera scan logs through the account-transfer engine.

mod config;
mod progress;
mod scan_log;

use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;

use kitscan_core::{
    AggregatorEvent, AssemblyOrder, Frame, ScanCommand, ScanOutcome, ScanPipeline, ScanReport,
};

use config::Config;
use progress::{ScanProgress, format_bytes, format_duration};

/// KITSCAN - Reassemble an account transfer from scanned QR codes
#[derive(Parser)]
#[command(name = "kitscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scan log and extract the transferred key
    Scan {
        /// Scan log, one camera outcome per line
        #[arg(required = true)]
        log: PathBuf,

        /// Barcode lines are hex encoded raw bytes
        #[arg(long)]
        hex: bool,

        /// Write the key to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Assemble body pages by page index instead of scan order
        #[arg(long)]
        page_index_order: bool,
    },

    /// Classify each line of a scan log without aggregating
    Inspect {
        /// Scan log, one camera outcome per line
        #[arg(required = true)]
        log: PathBuf,

        /// Barcode lines are hex encoded raw bytes
        #[arg(long)]
        hex: bool,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    // Validate configuration
    config.validate()?;

    // Initialize logging
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    console::set_colors_enabled(config.output.color);

    match cli.command {
        Commands::Scan {
            log,
            hex,
            output,
            page_index_order,
        } => {
            let mut config = config;
            if page_index_order {
                config.scanner.assembly_order = AssemblyOrder::PageIndex;
            }
            scan(&log, hex, output, &config).await?;
        }
        Commands::Inspect { log, hex } => {
            inspect(&log, hex)?;
        }
        Commands::Config => {
            show_config(&config, cli.config.as_deref())?;
        }
    }

    Ok(())
}

/// Replay a scan log through the scan pipeline
async fn scan(
    log: &Path,
    hex: bool,
    output: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<()> {
    tracing::info!("Replaying {:?}", log);

    let outcomes = scan_log::parse_log(std::fs::read_to_string(log)?, hex)?;
    let started = Instant::now();

    let ((cmd_tx, cmd_rx), (report_tx, mut report_rx)) = ScanPipeline::channel(&config.scanner);
    let pipeline = ScanPipeline::new(config.scanner.clone()).spawn(cmd_rx, report_tx);

    let producer = tokio::spawn(feed_outcomes(cmd_tx, outcomes, config.scanner.auto_verify));

    let progress = ScanProgress::new(config.output.progress);
    let mut failure = None;
    let mut delivered = false;

    while let Some(report) = report_rx.recv().await {
        match report {
            ScanReport::Event(event) => match event {
                AggregatorEvent::Started { metadata, progress: p } => {
                    if let Some(domain) = &metadata.domain {
                        progress.println(format!("Domain: {domain}"));
                    }
                    if let Some(transfer_id) = &metadata.transfer_id {
                        progress.println(format!("Transfer: {transfer_id}"));
                    }
                    progress.update(p);
                }
                AggregatorEvent::PageAccepted(p) => progress.update(p),
                AggregatorEvent::Duplicate { page_index } => {
                    progress.println(format!(
                        "{}",
                        style(format!("page {page_index} already scanned")).dim()
                    ));
                }
                AggregatorEvent::Issue(kind) => {
                    progress.println(format!("{}", style(kind.guidance()).yellow()));
                }
                AggregatorEvent::ScanFailed { cause } => {
                    progress.println(format!(
                        "{}",
                        style(format!("scan failed: {cause}")).red()
                    ));
                }
                AggregatorEvent::AccountKit(kit) => {
                    progress.println(format!("Account kit for {}", kit.display_name()));
                    write_key(
                        kit.private_key(),
                        output.as_deref().or(config.output.key_file.as_deref()),
                    )?;
                    delivered = true;
                }
                AggregatorEvent::Failed(err) => {
                    progress.println(format!("{}", style(&err).red()));
                    if err.is_terminal() {
                        failure = Some(err);
                    }
                }
            },
            ScanReport::Verified(key) => {
                write_key(
                    key.expose_secret(),
                    output.as_deref().or(config.output.key_file.as_deref()),
                )?;
                progress.println(format!("Key: {}", format_bytes(key.len() as u64)));
                delivered = true;
            }
            ScanReport::VerifyFailed(err) => failure = Some(err),
            ScanReport::Reset => {}
        }
    }

    producer.await?;
    pipeline.await?;

    let elapsed = format_duration(started.elapsed());
    if delivered {
        progress.finish_with_message(format!("{} in {elapsed}", style("Transfer complete").green()));
        Ok(())
    } else if let Some(err) = failure {
        progress.abandon_with_message(format!("{}", style("Transfer failed").red()));
        anyhow::bail!("transfer failed: {err}")
    } else {
        progress.abandon_with_message(format!("{}", style("Transfer incomplete").yellow()));
        anyhow::bail!("scan log ended before the transfer completed")
    }
}

/// Push replayed outcomes into the pipeline, then request verification
/// unless the pipeline verifies on its own. Returns the number of outcomes
/// delivered before the pipeline went away.
async fn feed_outcomes(
    cmd_tx: mpsc::Sender<ScanCommand>,
    outcomes: Vec<ScanOutcome>,
    auto_verify: bool,
) -> usize {
    let total = outcomes.len();
    let mut sent = 0;
    for outcome in outcomes {
        if cmd_tx.send(ScanCommand::Scan(outcome)).await.is_err() {
            tracing::debug!(sent, total, "pipeline closed, dropping remaining outcomes");
            return sent;
        }
        sent += 1;
    }
    if !auto_verify && cmd_tx.send(ScanCommand::Verify).await.is_err() {
        tracing::debug!("pipeline closed before verification was requested");
    }
    sent
}

/// Hand the key to its destination
fn write_key(key: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, key)?;
            tracing::info!("Key written to {:?}", path);
        }
        None => println!("{key}"),
    }
    Ok(())
}

/// Classify each scan log line
fn inspect(log: &Path, hex: bool) -> anyhow::Result<()> {
    let outcomes = scan_log::parse_log(std::fs::read_to_string(log)?, hex)?;

    for (idx, outcome) in outcomes.into_iter().enumerate() {
        let description = match Frame::classify(outcome) {
            Frame::FirstPage { version, metadata } => format!(
                "v{} first page, {} pages, hash {}...",
                version.as_u8(),
                metadata.total_pages,
                metadata.hash.get(..16).unwrap_or(metadata.hash.as_str())
            ),
            Frame::SubsequentPage {
                version,
                page_index,
                payload,
            } => format!(
                "v{} page {page_index}, {}",
                version.as_u8(),
                format_bytes(payload.len() as u64)
            ),
            Frame::AccountKitPage { version, kit, .. } => format!(
                "v{} account kit, {} at {}",
                version.as_u8(),
                kit.display_name(),
                kit.domain
            ),
            Frame::ScanFailure { cause } => format!("{}", style(format!("failure: {cause}")).red()),
            Frame::UserResolvableIssue(kind) => {
                format!("{}", style(format!("{kind:?}: {}", kind.guidance())).yellow())
            }
        };
        println!("{:>4}  {description}", idx + 1);
    }

    Ok(())
}

/// Print the effective configuration
fn show_config(config: &Config, path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.map_or_else(Config::default_path, Path::to_path_buf);
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
