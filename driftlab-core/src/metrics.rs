//! Instability metrics over an ingested series.
//!
//! One pass produces, per observation:
//! - `ret` — simple return against the previous value
//! - `roll_vol` — rolling sample std of the null-cleaned return series
//! - `roll_z` — rolling z-score of the raw value
//! - `instability` — `|roll_z| + roll_vol`, the composite score
//!
//! Every metric slot is `Option<f64>`. Warm-up rows and numeric
//! degeneracies (near-zero denominators, zero-variance windows) yield
//! `None` — never an error and never NaN.

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::rolling::{rolling_mean, rolling_std};
use crate::series::Point;

/// The full metric set for a single observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub date: String,
    pub value: f64,
    pub ret: Option<f64>,
    pub roll_vol: Option<f64>,
    pub roll_z: Option<f64>,
    /// Composite instability score, written to CSV as column `S_t`.
    #[serde(rename = "S_t")]
    pub instability: Option<f64>,
}

/// Compute the metric table for a series.
///
/// Total: no numeric input produces an error. Degenerate slots degrade to
/// `None` and the row count always equals the input length.
pub fn compute_metrics(points: &[Point], config: &RunConfig) -> Vec<MetricRow> {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let n = values.len();

    // Simple returns, guarded against a near-zero previous value.
    let mut rets: Vec<Option<f64>> = vec![None; n];
    for i in 1..n {
        let prev = values[i - 1];
        if prev.abs() > config.eps {
            rets[i] = Some(values[i] / prev - 1.0);
        }
    }

    // Volatility runs over the cleaned return series; null slots count as
    // zero returns inside the window. The cleaning is local to this input.
    let cleaned: Vec<f64> = rets.iter().map(|r| r.unwrap_or(0.0)).collect();
    let roll_vol = rolling_std(&cleaned, config.window);

    let mu = rolling_mean(&values, config.window);
    let sd = rolling_std(&values, config.window);

    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let roll_z = match (mu[i], sd[i]) {
            (Some(m), Some(s)) if s >= config.eps => Some((values[i] - m) / s),
            _ => None,
        };
        let instability = match (roll_z, roll_vol[i]) {
            (None, None) => None,
            (z, v) => Some(z.map_or(0.0, f64::abs) + v.unwrap_or(0.0)),
        };
        rows.push(MetricRow {
            date: points[i].date.clone(),
            value: values[i],
            ret: rets[i],
            roll_vol: roll_vol[i],
            roll_z,
            instability,
        });
    }
    rows
}
