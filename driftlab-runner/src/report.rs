//! Box-drawn text rendering of a verification report.
//!
//! Pure string building over a [`VerifyReport`]: a header box echoing the
//! promotion record, one box per check, and a final verdict line. Box
//! width tracks the longest line, so every report is a set of closed
//! rectangles regardless of path or digest lengths.

use crate::verify::{ReceiptStatus, VerifyReport};

/// Render the full report. No trailing newline; the caller decides.
pub fn render_report(report: &VerifyReport) -> String {
    let mut header = vec![
        format!("RUN_DIR: {}", report.run_dir.display()),
        format!("DECISION: {}", report.decision),
        format!("TS_UTC: {}", report.timestamp_utc),
        format!(
            "SIGN: operator={} cosign={}",
            report.operator_signature, report.cosign_signature
        ),
    ];
    header.push(if report.existence_ok() {
        "A (artifact existence): PASS".to_string()
    } else {
        format!(
            "A (artifact existence): HALT missing={}",
            report.missing_artifacts.join(",")
        )
    });

    let linkage_line = match &report.linkage {
        None => "UNAVAILABLE: run_bundle.json missing".to_string(),
        Some(issues) if issues.is_empty() => "PASS".to_string(),
        Some(issues) => {
            let joined: Vec<String> = issues.iter().map(ToString::to_string).collect();
            format!("HALT: {}", joined.join("; "))
        }
    };

    let mut receipt_lines = vec![format!(
        "R: {}",
        if report.receipts_ok() { "PASS" } else { "HALT" }
    )];
    for check in &report.receipts {
        let target = check.target.as_deref().unwrap_or("?");
        receipt_lines.push(match check.status {
            ReceiptStatus::Ok => format!("{}: OK | {}", check.receipt_file, target),
            ReceiptStatus::Malformed => format!("{}: FAIL | malformed", check.receipt_file),
            ReceiptStatus::MissingTarget => {
                format!("{}: FAIL | missing target {}", check.receipt_file, target)
            }
            ReceiptStatus::DigestMismatch => {
                format!("{}: FAIL | {}", check.receipt_file, target)
            }
        });
    }

    let verdict = if report.all_ok() {
        "VERDICT: PASS"
    } else {
        "VERDICT: HALT"
    };

    format!(
        "{}\n\n{}\n\n{}\n\n{}",
        draw_box("DRIFTLAB RUN RECEIPT", &header),
        draw_box("LINKAGE CHECK", &[linkage_line]),
        draw_box("RECEIPT VERIFICATION", &receipt_lines),
        verdict
    )
}

/// One closed box: title row, separator, body rows.
fn draw_box(title: &str, lines: &[String]) -> String {
    let width = std::iter::once(title.chars().count())
        .chain(lines.iter().map(|l| l.chars().count()))
        .max()
        .unwrap_or(0);
    let horizontal = "─".repeat(width + 2);

    let mut out = String::new();
    out.push_str(&format!("┌{horizontal}┐\n"));
    out.push_str(&format!("│ {title:<width$} │\n"));
    out.push_str(&format!("├{horizontal}┤\n"));
    for line in lines {
        out.push_str(&format!("│ {line:<width$} │\n"));
    }
    out.push_str(&format!("└{horizontal}┘"));
    out
}
