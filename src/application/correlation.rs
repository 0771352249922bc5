//! Pairwise correlation data for grouped-histogram rendering.
//!
//! Produces the numbers only; plotting lives outside the crate.

use serde::Serialize;

use crate::domain::errors::ClusterError;
use crate::domain::labels::LabelMap;
use crate::domain::table::TimeSeriesTable;

/// One unordered asset pair with its return correlation, excluding
/// self-pairs and duplicates (lower triangle only).
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationPair {
    pub left: String,
    pub right: String,
    pub correlation: f64,
    /// Whether both assets carry the same label, when a labeling is given.
    pub together: Option<bool>,
}

/// Pearson correlation of every distinct column pair.
///
/// With a labeling, each pair is tagged as within-group or across-group;
/// a symbol absent from the map fails with `MissingLabel`.
pub fn correlation_pairs(
    table: &TimeSeriesTable,
    labels: Option<&LabelMap>,
) -> Result<Vec<CorrelationPair>, ClusterError> {
    let symbols = table.symbols();

    if let Some(labels) = labels {
        for symbol in &symbols {
            if !labels.contains(symbol) {
                return Err(ClusterError::MissingLabel {
                    symbol: symbol.clone(),
                });
            }
        }
    }

    let mut pairs = Vec::with_capacity(symbols.len() * symbols.len().saturating_sub(1) / 2);
    for i in 0..symbols.len() {
        for j in 0..i {
            let left = &symbols[i];
            let right = &symbols[j];
            let correlation = pearson(
                table.column(left).unwrap_or_default(),
                table.column(right).unwrap_or_default(),
            );
            let together = labels.map(|l| l.get(left) == l.get(right));

            pairs.push(CorrelationPair {
                left: left.clone(),
                right: right.clone(),
                correlation,
                together,
            });
        }
    }

    Ok(pairs)
}

fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom > 0.0 { cov / denom } else { 0.0 }
}
