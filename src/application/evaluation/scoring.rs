use indexmap::IndexMap;

use crate::application::cluster_input::FeatureMatrix;
use crate::domain::errors::ClusterError;
use crate::domain::labels::LabelMap;
use crate::domain::table::TimeSeriesTable;

/// Within-cluster sum of squares over a labeled table (assets as columns).
///
/// For each distinct label, the member columns are centered by the group's
/// cross-sectional mean at every row; the squared Frobenius norms of the
/// centered blocks are summed. Lower is better.
pub fn wcss(table: &TimeSeriesTable, labels: &LabelMap) -> Result<f64, ClusterError> {
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for symbol in table.symbols() {
        let label = labels.get(&symbol).ok_or(ClusterError::MissingLabel {
            symbol: symbol.clone(),
        })?;
        groups.entry(label.to_string()).or_default().push(symbol);
    }

    let mut total = 0.0;
    for members in groups.values() {
        let group = table.select(members)?;
        let means = group.row_means();
        for (_, values) in group.iter_columns() {
            for (v, m) in values.iter().zip(&means) {
                let d = v - m;
                total += d * d;
            }
        }
    }

    Ok(total)
}

/// WCSS over an oriented feature matrix (assets as rows).
///
/// Same quantity as [`wcss`] with the axes swapped: groups are centered by
/// their per-observation mean.
pub fn wcss_rows(features: &FeatureMatrix, labels: &[String]) -> f64 {
    let n_features = features.n_features();

    let mut groups: IndexMap<&str, Vec<usize>> = IndexMap::new();
    for (row, label) in labels.iter().enumerate() {
        groups.entry(label.as_str()).or_default().push(row);
    }

    let mut total = 0.0;
    for rows in groups.values() {
        let count = rows.len() as f64;
        for col in 0..n_features {
            let mean = rows.iter().map(|&r| features.row(r)[col]).sum::<f64>() / count;
            for &r in rows {
                let d = features.row(r)[col] - mean;
                total += d * d;
            }
        }
    }

    total
}

/// Negated row-wise WCSS, usable directly as a maximizing grid-search score.
pub fn negated_wcss(features: &FeatureMatrix, labels: &[String]) -> f64 {
    -wcss_rows(features, labels)
}
