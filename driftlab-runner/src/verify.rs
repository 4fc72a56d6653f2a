//! Read-only verification of a published run directory.
//!
//! Three independent checks, all of which always run:
//! - **Existence:** the four canonical artifacts are present.
//! - **Linkage:** every digest recorded in the bundle's `outputs` still
//!   matches a re-hash of the named file.
//! - **Receipts:** every `*.sha256` sidecar, in sorted order, names a
//!   target whose re-hash matches the receipt digest.
//!
//! Failed checks are findings inside the [`VerifyReport`], never errors.
//! A sidecar whose line does not even parse is itself a failed check.
//! [`VerifyError`] is reserved for state the checks cannot see past: an
//! unreadable file or invalid JSON. Verification never writes, so
//! running it twice over the same directory yields equal reports.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use driftlab_core::receipt::{sha256_file, Receipt, RECEIPT_EXTENSION};

use crate::artifacts::{CANONICAL_ARTIFACTS, PROMOTION_RECORD_JSON, RUN_BUNDLE_JSON};

/// Fatal verification failures. Policy findings live in the report.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("failed to read {}: {source}", .path.display())]
    Unreadable { path: PathBuf, source: io::Error },

    #[error("corrupt JSON in {}: {source}", .path.display())]
    CorruptJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to list run directory {}: {source}", .path.display())]
    ListDir { path: PathBuf, source: io::Error },
}

/// One problem found while re-hashing the bundle's recorded outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkageIssue {
    MissingTarget { filename: String },
    DigestMismatch { filename: String },
}

impl fmt::Display for LinkageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkageIssue::MissingTarget { filename } => write!(f, "missing {filename}"),
            LinkageIssue::DigestMismatch { filename } => write!(f, "hash mismatch {filename}"),
        }
    }
}

/// Outcome of checking one receipt sidecar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Ok,
    /// The sidecar's line does not parse as a receipt.
    Malformed,
    MissingTarget,
    DigestMismatch,
}

/// One verified receipt sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptCheck {
    /// The sidecar filename (e.g. `metrics.csv.sha256`).
    pub receipt_file: String,
    /// The filename the receipt claims to cover; `None` when the line
    /// does not parse.
    pub target: Option<String>,
    pub status: ReceiptStatus,
}

/// Everything the verifier learned about one run directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub run_dir: PathBuf,
    /// Echoed from the promotion record; `?` when absent.
    pub decision: String,
    /// Echoed from the promotion record; `?` when absent.
    pub timestamp_utc: String,
    /// Echoed from the promotion record's signature block; `?` when absent.
    pub operator_signature: String,
    /// Echoed from the promotion record's signature block; `?` when absent.
    pub cosign_signature: String,
    /// Canonical artifacts not found in the directory.
    pub missing_artifacts: Vec<String>,
    /// Linkage findings; `None` when `run_bundle.json` itself is absent
    /// and there is nothing to check against.
    pub linkage: Option<Vec<LinkageIssue>>,
    /// Every `*.sha256` sidecar in sorted order.
    pub receipts: Vec<ReceiptCheck>,
}

impl VerifyReport {
    pub fn existence_ok(&self) -> bool {
        self.missing_artifacts.is_empty()
    }

    pub fn linkage_ok(&self) -> bool {
        matches!(&self.linkage, Some(issues) if issues.is_empty())
    }

    pub fn receipts_ok(&self) -> bool {
        self.receipts.iter().all(|r| r.status == ReceiptStatus::Ok)
    }

    /// True when all three checks passed.
    pub fn all_ok(&self) -> bool {
        self.existence_ok() && self.linkage_ok() && self.receipts_ok()
    }
}

/// Verify a run directory. Read-only and idempotent.
pub fn verify_run(dir: &Path) -> Result<VerifyReport, VerifyError> {
    let missing_artifacts: Vec<String> = CANONICAL_ARTIFACTS
        .iter()
        .filter(|name| !dir.join(name).exists())
        .map(|name| name.to_string())
        .collect();

    let promo = read_json_if_present(&dir.join(PROMOTION_RECORD_JSON))?;
    let (decision, timestamp_utc, operator_signature, cosign_signature) =
        echo_fields(promo.as_ref());

    let bundle = read_json_if_present(&dir.join(RUN_BUNDLE_JSON))?;
    let linkage = match &bundle {
        None => None,
        Some(b) => Some(check_linkage(dir, b)?),
    };

    let receipts = check_receipts(dir)?;

    Ok(VerifyReport {
        run_dir: dir.to_path_buf(),
        decision,
        timestamp_utc,
        operator_signature,
        cosign_signature,
        missing_artifacts,
        linkage,
        receipts,
    })
}

/// Read and parse a JSON artifact. A missing file is `None`; an
/// unreadable or unparseable one is fatal.
fn read_json_if_present(path: &Path) -> Result<Option<Value>, VerifyError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(VerifyError::Unreadable {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let value = serde_json::from_str(&text).map_err(|source| VerifyError::CorruptJson {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(value))
}

/// Pull the echo fields out of the promotion record, tolerating any
/// missing or oddly-typed field.
fn echo_fields(promo: Option<&Value>) -> (String, String, String, String) {
    let field = |key: &str| {
        promo
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string()
    };
    let signature = |key: &str| {
        promo
            .and_then(|p| p.get("signatures"))
            .and_then(|s| s.get(key))
            .and_then(Value::as_str)
            .unwrap_or("?")
            .to_string()
    };
    (
        field("decision"),
        field("timestamp_utc"),
        signature("operator"),
        signature("cosign"),
    )
}

/// Re-hash every file the bundle's `outputs` map names.
fn check_linkage(dir: &Path, bundle: &Value) -> Result<Vec<LinkageIssue>, VerifyError> {
    let mut issues = Vec::new();
    let Some(outputs) = bundle.get("outputs").and_then(Value::as_object) else {
        return Ok(issues);
    };
    for (filename, recorded) in outputs {
        let target = dir.join(filename);
        if !target.exists() {
            issues.push(LinkageIssue::MissingTarget {
                filename: filename.clone(),
            });
            continue;
        }
        let actual = sha256_file(&target).map_err(|source| VerifyError::Unreadable {
            path: target.clone(),
            source,
        })?;
        if recorded.as_str() != Some(actual.as_str()) {
            issues.push(LinkageIssue::DigestMismatch {
                filename: filename.clone(),
            });
        }
    }
    Ok(issues)
}

/// Parse and re-check every `*.sha256` sidecar, in sorted path order.
/// A sidecar that fails to parse becomes a `Malformed` finding.
fn check_receipts(dir: &Path) -> Result<Vec<ReceiptCheck>, VerifyError> {
    let entries = fs::read_dir(dir).map_err(|source| VerifyError::ListDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut receipt_paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| VerifyError::ListDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some(RECEIPT_EXTENSION) {
            receipt_paths.push(path);
        }
    }
    receipt_paths.sort();

    let mut checks = Vec::with_capacity(receipt_paths.len());
    for path in receipt_paths {
        let text = fs::read_to_string(&path).map_err(|source| VerifyError::Unreadable {
            path: path.clone(),
            source,
        })?;

        let (target, status) = match Receipt::parse(&text) {
            Err(_) => (None, ReceiptStatus::Malformed),
            Ok(receipt) => {
                let target = dir.join(&receipt.filename);
                let status = if !target.exists() {
                    ReceiptStatus::MissingTarget
                } else {
                    let actual = sha256_file(&target).map_err(|source| VerifyError::Unreadable {
                        path: target.clone(),
                        source,
                    })?;
                    if actual == receipt.digest {
                        ReceiptStatus::Ok
                    } else {
                        ReceiptStatus::DigestMismatch
                    }
                };
                (Some(receipt.filename), status)
            }
        };

        checks.push(ReceiptCheck {
            receipt_file: filename_of(&path),
            target,
            status,
        });
    }
    Ok(checks)
}

fn filename_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
