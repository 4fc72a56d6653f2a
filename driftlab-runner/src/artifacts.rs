//! Artifact serialization — CSV tables, canonical JSON, durable writes.
//!
//! Every published artifact goes through `write_artifact`, which:
//! 1. writes the bytes and syncs them to disk,
//! 2. re-reads the file and digests what the filesystem actually holds,
//! 3. writes a `<name>.sha256` receipt sidecar beside it.
//!
//! JSON artifacts use a canonical encoding: the value is rebuilt as a
//! sorted-key tree before pretty-printing, so re-serializing an equal
//! value is byte-identical regardless of struct field order.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use driftlab_core::metrics::MetricRow;
use driftlab_core::receipt::{receipt_filename, sha256_file, Receipt};
use driftlab_core::series::Point;

// ─── Canonical artifact names ───────────────────────────────────────

/// The normalized input series.
pub const NORMALIZED_CSV: &str = "normalized.csv";
/// The computed metric table.
pub const METRICS_CSV: &str = "metrics.csv";
/// The run bundle linking config, inputs, and output digests.
pub const RUN_BUNDLE_JSON: &str = "run_bundle.json";
/// The promotion record sealing the chain.
pub const PROMOTION_RECORD_JSON: &str = "PROMOTION_RECORD.json";

/// All four artifacts of a published run, in chain order.
pub const CANONICAL_ARTIFACTS: [&str; 4] = [
    NORMALIZED_CSV,
    METRICS_CSV,
    RUN_BUNDLE_JSON,
    PROMOTION_RECORD_JSON,
];

// ─── Canonical JSON ─────────────────────────────────────────────────

/// Serialize a value to canonical JSON: sorted keys, 2-space indentation.
///
/// The round-trip through `serde_json::Value` is what sorts the keys; the
/// crate's default map representation keeps them ordered.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let tree = serde_json::to_value(value).context("failed to build JSON value tree")?;
    serde_json::to_string_pretty(&tree).context("failed to render canonical JSON")
}

// ─── CSV generation ─────────────────────────────────────────────────

/// Render the normalized series as `date,value` CSV.
pub fn normalized_csv(points: &[Point]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "value"])?;
    for p in points {
        wtr.write_record([&p.date, &p.value.to_string()])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Render the metric table as `date,value,ret,roll_vol,roll_z,S_t` CSV.
///
/// Absent metric slots become empty fields, never a sentinel number.
pub fn metrics_csv(rows: &[MetricRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "value", "ret", "roll_vol", "roll_z", "S_t"])?;
    for row in rows {
        wtr.write_record([
            &row.date,
            &row.value.to_string(),
            &opt_field(row.ret),
            &opt_field(row.roll_vol),
            &opt_field(row.roll_z),
            &opt_field(row.instability),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn opt_field(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

// ─── Durable writes ─────────────────────────────────────────────────

/// A freshly published artifact and the digest of its on-disk bytes.
#[derive(Debug, Clone)]
pub struct WrittenArtifact {
    pub filename: String,
    pub digest: String,
}

/// Write bytes and sync them before returning.
fn write_durable(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Write one artifact plus its receipt sidecar into `dir`.
///
/// The digest comes from re-reading the file after the sync, so the
/// receipt covers the bytes the filesystem actually holds.
pub fn write_artifact(dir: &Path, filename: &str, bytes: &[u8]) -> Result<WrittenArtifact> {
    let path = dir.join(filename);
    write_durable(&path, bytes)
        .with_context(|| format!("failed to write artifact: {}", path.display()))?;

    let digest = sha256_file(&path)
        .with_context(|| format!("failed to re-read artifact: {}", path.display()))?;

    let receipt = Receipt::new(digest.clone(), filename);
    let receipt_path = dir.join(receipt_filename(filename));
    write_durable(&receipt_path, receipt.format().as_bytes())
        .with_context(|| format!("failed to write receipt: {}", receipt_path.display()))?;

    Ok(WrittenArtifact {
        filename: filename.to_string(),
        digest,
    })
}
