//! DriftLab Runner — the provenance chain and its verifier.
//!
//! This crate builds on `driftlab-core` to provide:
//! - Artifact serialization (CSV tables, canonical JSON, receipts)
//! - Run bundle and promotion record assembly
//! - The chain writer (stage, hash, link, publish atomically)
//! - The independent verifier (existence, linkage, receipts)
//! - Box-drawn report rendering

pub mod artifacts;
pub mod bundle;
pub mod chain;
pub mod report;
pub mod verify;

pub use artifacts::{canonical_json, write_artifact, WrittenArtifact, CANONICAL_ARTIFACTS};
pub use bundle::{Decision, PromotionRecord, RunBundle, PROMOTION_VERSION};
pub use chain::{run_chain, ChainError, RunOutcome};
pub use report::render_report;
pub use verify::{
    verify_run, LinkageIssue, ReceiptCheck, ReceiptStatus, VerifyError, VerifyReport,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn run_outcome_is_send_sync() {
        assert_send::<RunOutcome>();
        assert_sync::<RunOutcome>();
    }

    #[test]
    fn chain_error_is_send_sync() {
        assert_send::<ChainError>();
        assert_sync::<ChainError>();
    }

    #[test]
    fn wire_types_are_send_sync() {
        assert_send::<RunBundle>();
        assert_sync::<RunBundle>();
        assert_send::<PromotionRecord>();
        assert_sync::<PromotionRecord>();
        assert_send::<Decision>();
        assert_sync::<Decision>();
    }

    #[test]
    fn verify_report_is_send_sync() {
        assert_send::<VerifyReport>();
        assert_sync::<VerifyReport>();
    }

    #[test]
    fn verify_error_is_send_sync() {
        assert_send::<VerifyError>();
        assert_sync::<VerifyError>();
    }

    #[test]
    fn written_artifact_is_send_sync() {
        assert_send::<WrittenArtifact>();
        assert_sync::<WrittenArtifact>();
    }
}
