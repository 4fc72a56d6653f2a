//! Wire types for the two JSON artifacts of a run.
//!
//! `run_bundle.json` links the run configuration and the input provenance
//! to the digests of the CSV outputs. `PROMOTION_RECORD.json` seals the
//! chain: it repeats those digests and adds the digest of the bundle
//! itself, so any later edit to an upstream artifact breaks a recorded
//! hash somewhere downstream.
//!
//! Both artifacts serialize through `artifacts::canonical_json`, so field
//! order here never reaches the wire; keys are always sorted.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Version tag stamped into every promotion record.
pub const PROMOTION_VERSION: &str = "DRIFTLAB-PROMO-1.0";

/// Advisory run decision. This version always records `PASS`; acting on
/// the decision is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Pass,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Pass => write!(f, "PASS"),
        }
    }
}

/// Where and when the run happened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunMeta {
    /// ISO-8601 UTC, seconds precision, `Z` suffix.
    pub timestamp_utc: String,
    /// Working directory of the producing process.
    pub cwd: String,
}

/// The determinism-relevant slice of the run configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigEcho {
    pub version: String,
    pub window: usize,
    pub eps: f64,
}

/// Provenance of the input series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputsBlock {
    pub source_path: String,
    pub source_digest: String,
    pub row_count: usize,
}

/// Body of `run_bundle.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunBundle {
    pub run_meta: RunMeta,
    pub config: ConfigEcho,
    pub inputs: InputsBlock,
    /// Digests of the CSV artifacts, keyed by filename.
    pub outputs: BTreeMap<String, String>,
    pub decision: Decision,
}

/// Opaque signature labels. There is no cryptography behind them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signatures {
    pub operator: String,
    pub cosign: String,
}

/// Row counts sealed into the promotion record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Counts {
    pub rows: usize,
}

/// Body of `PROMOTION_RECORD.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromotionRecord {
    pub promotion_version: String,
    pub timestamp_utc: String,
    pub decision: Decision,
    /// Reserved; always null in this version.
    pub first_refusal: Option<String>,
    pub counts: Counts,
    /// CSV digests plus the digest of `run_bundle.json` itself.
    pub outputs: BTreeMap<String, String>,
    pub signatures: Signatures,
}
