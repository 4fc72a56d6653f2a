//! The provenance chain — ingest, compute, stage, publish.
//!
//! `run_chain()` turns one input CSV into a published run directory of
//! four artifacts, each with a receipt sidecar. The artifacts link
//! through embedded digests: the bundle records the CSV digests, the
//! promotion record records those plus the bundle digest.
//!
//! Publication is all-or-nothing. Everything is written into a sibling
//! staging directory first and the final step is a single rename; a run
//! that fails at any point removes its staging directory and leaves the
//! output path untouched.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use thiserror::Error;

use driftlab_core::config::RunConfig;
use driftlab_core::metrics::{compute_metrics, MetricRow};
use driftlab_core::receipt::sha256_hex;
use driftlab_core::series::{parse_series, IngestError, Point};

use crate::artifacts::{
    canonical_json, metrics_csv, normalized_csv, write_artifact, METRICS_CSV, NORMALIZED_CSV,
    PROMOTION_RECORD_JSON, RUN_BUNDLE_JSON,
};
use crate::bundle::{
    ConfigEcho, Counts, Decision, InputsBlock, PromotionRecord, RunBundle, RunMeta, Signatures,
    PROMOTION_VERSION,
};

/// Errors from the chain writer.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("failed to read input {}: {source}", .path.display())]
    ReadInput { path: PathBuf, source: io::Error },

    #[error("input rejected: {0}")]
    Ingest(#[from] IngestError),

    #[error("output directory is occupied: {}", .0.display())]
    OutdirOccupied(PathBuf),

    #[error("failed to inspect output directory {}: {source}", .path.display())]
    InspectOutdir { path: PathBuf, source: io::Error },

    #[error("staging failed: {0}")]
    Stage(#[from] anyhow::Error),

    #[error("failed to publish run directory {}: {source}", .outdir.display())]
    Publish { outdir: PathBuf, source: io::Error },
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The published run directory.
    pub run_dir: PathBuf,
    /// Number of data rows ingested (and of metric rows written).
    pub row_count: usize,
    /// Advisory decision recorded in the artifacts.
    pub decision: Decision,
    /// Digest of every published artifact, keyed by filename.
    pub outputs: BTreeMap<String, String>,
}

/// Run the full pipeline: read and digest the input, compute metrics,
/// stage the four artifacts with receipts, publish atomically.
///
/// Ingestion failures abort before anything touches the filesystem. An
/// occupied `outdir` is rejected; an existing but empty one is replaced.
pub fn run_chain(
    input: &Path,
    outdir: &Path,
    config: &RunConfig,
) -> Result<RunOutcome, ChainError> {
    // One read serves both the provenance digest and the parse.
    let raw = fs::read(input).map_err(|source| ChainError::ReadInput {
        path: input.to_path_buf(),
        source,
    })?;
    let source_digest = sha256_hex(&raw);
    let points = parse_series(raw.as_slice())?;
    let rows = compute_metrics(&points, config);

    match is_occupied(outdir) {
        Ok(false) => {}
        Ok(true) => return Err(ChainError::OutdirOccupied(outdir.to_path_buf())),
        Err(source) => {
            return Err(ChainError::InspectOutdir {
                path: outdir.to_path_buf(),
                source,
            })
        }
    }

    let staging = staging_dir(outdir);
    let outputs = match stage_artifacts(&staging, input, &source_digest, &points, &rows, config) {
        Ok(outputs) => outputs,
        Err(e) => {
            let _ = fs::remove_dir_all(&staging);
            return Err(ChainError::Stage(e));
        }
    };

    if let Err(source) = publish(&staging, outdir) {
        let _ = fs::remove_dir_all(&staging);
        return Err(ChainError::Publish {
            outdir: outdir.to_path_buf(),
            source,
        });
    }

    Ok(RunOutcome {
        run_dir: outdir.to_path_buf(),
        row_count: points.len(),
        decision: Decision::Pass,
        outputs,
    })
}

/// True when the path exists and holds at least one entry.
fn is_occupied(dir: &Path) -> io::Result<bool> {
    match fs::read_dir(dir) {
        Ok(mut entries) => Ok(entries.next().is_some()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Sibling staging path: `<outdir>.staging`.
fn staging_dir(outdir: &Path) -> PathBuf {
    let mut name = outdir
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("run"));
    name.push(".staging");
    outdir.with_file_name(name)
}

/// Write all four artifacts plus receipts into the staging directory, in
/// chain order, returning every digest keyed by filename.
fn stage_artifacts(
    staging: &Path,
    input: &Path,
    source_digest: &str,
    points: &[Point],
    rows: &[MetricRow],
    config: &RunConfig,
) -> anyhow::Result<BTreeMap<String, String>> {
    if staging.exists() {
        // Leftover from an interrupted run; this run owns the name now.
        fs::remove_dir_all(staging)
            .with_context(|| format!("failed to clear stale staging dir: {}", staging.display()))?;
    }
    fs::create_dir_all(staging)
        .with_context(|| format!("failed to create staging dir: {}", staging.display()))?;

    let normalized = write_artifact(staging, NORMALIZED_CSV, normalized_csv(points)?.as_bytes())?;
    let metrics = write_artifact(staging, METRICS_CSV, metrics_csv(rows)?.as_bytes())?;

    let timestamp_utc = utc_timestamp();
    let mut csv_digests = BTreeMap::new();
    csv_digests.insert(normalized.filename.clone(), normalized.digest.clone());
    csv_digests.insert(metrics.filename.clone(), metrics.digest.clone());

    let bundle = RunBundle {
        run_meta: RunMeta {
            timestamp_utc: timestamp_utc.clone(),
            cwd: current_dir_label(),
        },
        config: ConfigEcho {
            version: config.version.clone(),
            window: config.window,
            eps: config.eps,
        },
        inputs: InputsBlock {
            source_path: input.display().to_string(),
            source_digest: source_digest.to_string(),
            row_count: points.len(),
        },
        outputs: csv_digests.clone(),
        decision: Decision::Pass,
    };
    let bundle_artifact =
        write_artifact(staging, RUN_BUNDLE_JSON, canonical_json(&bundle)?.as_bytes())?;

    let mut sealed = csv_digests;
    sealed.insert(bundle_artifact.filename.clone(), bundle_artifact.digest.clone());

    let record = PromotionRecord {
        promotion_version: PROMOTION_VERSION.to_string(),
        timestamp_utc,
        decision: Decision::Pass,
        first_refusal: None,
        counts: Counts { rows: rows.len() },
        outputs: sealed.clone(),
        signatures: Signatures {
            operator: config.operator_signature.clone(),
            cosign: config.cosign_signature.clone(),
        },
    };
    let record_artifact = write_artifact(
        staging,
        PROMOTION_RECORD_JSON,
        canonical_json(&record)?.as_bytes(),
    )?;

    let mut outputs = sealed;
    outputs.insert(record_artifact.filename.clone(), record_artifact.digest.clone());
    Ok(outputs)
}

/// Move the staged directory onto the output path.
fn publish(staging: &Path, outdir: &Path) -> io::Result<()> {
    // The occupancy check passed, so anything still present is empty.
    if outdir.exists() {
        fs::remove_dir(outdir)?;
    }
    fs::rename(staging, outdir)
}

fn utc_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn current_dir_label() -> String {
    std::env::current_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|_| "?".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftlab_core::receipt::sha256_file;

    fn sample_csv() -> &'static str {
        "date,value\n2024-01-02,100\n2024-01-03,101\n2024-01-04,103\n"
    }

    fn run_sample(dir: &Path) -> (PathBuf, RunOutcome) {
        let input = dir.join("input.csv");
        fs::write(&input, sample_csv()).unwrap();
        let outdir = dir.join("run");
        let outcome = run_chain(&input, &outdir, &RunConfig::default()).unwrap();
        (outdir, outcome)
    }

    #[test]
    fn publishes_four_artifacts_with_receipts() {
        let tmp = tempfile::tempdir().unwrap();
        let (outdir, outcome) = run_sample(tmp.path());

        for name in crate::artifacts::CANONICAL_ARTIFACTS {
            assert!(outdir.join(name).exists(), "missing {name}");
            assert!(
                outdir.join(format!("{name}.sha256")).exists(),
                "missing receipt for {name}"
            );
        }
        assert_eq!(outcome.row_count, 3);
        assert_eq!(outcome.decision, Decision::Pass);
        assert_eq!(outcome.outputs.len(), 4);
    }

    #[test]
    fn outcome_digests_match_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let (outdir, outcome) = run_sample(tmp.path());

        for (name, digest) in &outcome.outputs {
            assert_eq!(&sha256_file(&outdir.join(name)).unwrap(), digest);
        }
    }

    #[test]
    fn staging_dir_is_gone_after_publish() {
        let tmp = tempfile::tempdir().unwrap();
        let (outdir, _) = run_sample(tmp.path());
        assert!(!staging_dir(&outdir).exists());
    }

    #[test]
    fn occupied_outdir_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("input.csv");
        fs::write(&input, sample_csv()).unwrap();
        let outdir = tmp.path().join("run");
        fs::create_dir(&outdir).unwrap();
        fs::write(outdir.join("junk.txt"), "x").unwrap();

        let err = run_chain(&input, &outdir, &RunConfig::default()).unwrap_err();
        assert!(matches!(err, ChainError::OutdirOccupied(_)));
        // The occupant is untouched.
        assert!(outdir.join("junk.txt").exists());
        assert!(!outdir.join("normalized.csv").exists());
    }

    #[test]
    fn empty_outdir_is_replaced() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("input.csv");
        fs::write(&input, sample_csv()).unwrap();
        let outdir = tmp.path().join("run");
        fs::create_dir(&outdir).unwrap();

        let outcome = run_chain(&input, &outdir, &RunConfig::default()).unwrap();
        assert_eq!(outcome.row_count, 3);
        assert!(outdir.join("PROMOTION_RECORD.json").exists());
    }

    #[test]
    fn ingest_failure_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("input.csv");
        fs::write(&input, "date,price\n2024-01-02,100\n").unwrap();
        let outdir = tmp.path().join("run");

        let err = run_chain(&input, &outdir, &RunConfig::default()).unwrap_err();
        assert!(matches!(err, ChainError::Ingest(_)));
        assert!(!outdir.exists());
        assert!(!staging_dir(&outdir).exists());
    }

    #[test]
    fn missing_input_is_read_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = run_chain(
            &tmp.path().join("absent.csv"),
            &tmp.path().join("run"),
            &RunConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ChainError::ReadInput { .. }));
    }

    #[test]
    fn stale_staging_dir_is_cleared() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("input.csv");
        fs::write(&input, sample_csv()).unwrap();
        let outdir = tmp.path().join("run");

        let stale = staging_dir(&outdir);
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("leftover.txt"), "x").unwrap();

        let outcome = run_chain(&input, &outdir, &RunConfig::default()).unwrap();
        assert_eq!(outcome.row_count, 3);
        assert!(!outdir.join("leftover.txt").exists());
        assert!(!stale.exists());
    }

    #[test]
    fn bundle_embeds_csv_digests_and_record_seals_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        let (outdir, outcome) = run_sample(tmp.path());

        let bundle: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(outdir.join(RUN_BUNDLE_JSON)).unwrap())
                .unwrap();
        let record: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(outdir.join(PROMOTION_RECORD_JSON)).unwrap())
                .unwrap();

        for name in [NORMALIZED_CSV, METRICS_CSV] {
            let digest = bundle["outputs"][name].as_str().unwrap();
            assert_eq!(digest, outcome.outputs[name]);
            assert_eq!(record["outputs"][name].as_str().unwrap(), digest);
        }
        assert_eq!(
            record["outputs"][RUN_BUNDLE_JSON].as_str().unwrap(),
            outcome.outputs[RUN_BUNDLE_JSON]
        );
        assert_eq!(record["counts"]["rows"].as_u64().unwrap(), 3);
        assert_eq!(record["decision"].as_str().unwrap(), "PASS");
        assert_eq!(bundle["inputs"]["row_count"].as_u64().unwrap(), 3);
        assert_eq!(
            bundle["inputs"]["source_digest"].as_str().unwrap(),
            sha256_hex(sample_csv().as_bytes())
        );
    }

    #[test]
    fn staging_name_is_sibling_of_outdir() {
        let staged = staging_dir(Path::new("/tmp/runs/out"));
        assert_eq!(staged, Path::new("/tmp/runs/out.staging"));
    }
}
