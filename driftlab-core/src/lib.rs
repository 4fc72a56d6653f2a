//! DriftLab Core — series ingestion, rolling statistics, instability metrics, receipts.
//!
//! This crate contains the pure engine of the pipeline:
//! - CSV series ingestion with a typed, fail-fast error taxonomy
//! - Rolling mean and rolling sample standard deviation kernels
//! - The instability metrics pass (returns, volatility, z-score, composite score)
//! - SHA-256 content digests and `.sha256` receipt formatting and parsing
//! - Run configuration with TOML loading
//!
//! Nothing in this crate touches the filesystem except the streaming file
//! digest and config loading; orchestration lives in `driftlab-runner`.

pub mod config;
pub mod metrics;
pub mod receipt;
pub mod rolling;
pub mod series;
