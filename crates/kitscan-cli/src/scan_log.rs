//! Captured scan log format.
//!
//! One camera outcome per line:
//!
//! ```text
//! 100{"totalPages":3,"hash":"..."}    decoded barcode, raw text
//! #no-barcode                         nothing in view
//! #multiple-barcodes                  several codes in view
//! #unreadable                         code found but no raw bytes
//! #error camera closed                decoder error with its cause
//! ## free text                        comment
//! ```
//!
//! With `--hex` each barcode line holds the raw bytes hex encoded.

use anyhow::Context;
use kitscan_core::ScanOutcome;
use zeroize::Zeroize;

/// Parse one log line. Blank lines and comments yield `None`.
///
/// # Errors
///
/// Returns an error for unknown directives or invalid hex.
pub fn parse_line(line: &str, hex_encoded: bool) -> anyhow::Result<Option<ScanOutcome>> {
    let line = line.trim_end_matches(['\r', '\n']);

    if line.trim().is_empty() || line.starts_with("##") {
        return Ok(None);
    }

    if let Some(directive) = line.strip_prefix('#') {
        let (name, rest) = directive
            .split_once(' ')
            .map_or((directive, ""), |(name, rest)| (name, rest.trim()));

        let outcome = match name {
            "no-barcode" => ScanOutcome::NoBarcode,
            "multiple-barcodes" => ScanOutcome::MultipleBarcodes,
            "unreadable" => ScanOutcome::Barcode(None),
            "error" => ScanOutcome::DecoderError(if rest.is_empty() {
                "decoder error".to_string()
            } else {
                rest.to_string()
            }),
            other => anyhow::bail!("unknown directive: #{other}"),
        };
        return Ok(Some(outcome));
    }

    let bytes = if hex_encoded {
        hex::decode(line.trim()).context("invalid hex frame")?
    } else {
        line.as_bytes().to_vec()
    };

    Ok(Some(ScanOutcome::Barcode(Some(bytes))))
}

/// Parse a whole log, wiping the source text afterwards.
///
/// # Errors
///
/// Returns an error naming the first offending line.
pub fn parse_log(mut contents: String, hex_encoded: bool) -> anyhow::Result<Vec<ScanOutcome>> {
    let parsed = contents
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            parse_line(line, hex_encoded)
                .with_context(|| format!("line {}", idx + 1))
                .transpose()
        })
        .collect();

    contents.zeroize();
    parsed
}
