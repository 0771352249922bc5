use indexmap::IndexMap;

use super::Transform;
use crate::domain::errors::ClusterError;
use crate::domain::table::TimeSeriesTable;

/// Scale each asset's series to unit Euclidean length over time.
///
/// An all-zero series has no unit direction and is left unchanged.
pub struct L2Normalize;

pub(crate) fn l2_norm(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum::<f64>().sqrt()
}

impl Transform for L2Normalize {
    fn name(&self) -> &'static str {
        "l2_normalize"
    }

    fn apply(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable, ClusterError> {
        let columns: IndexMap<String, Vec<f64>> = table
            .iter_columns()
            .map(|(name, values)| {
                let norm = l2_norm(values);
                let scaled = if norm > 0.0 {
                    values.iter().map(|v| v / norm).collect()
                } else {
                    values.to_vec()
                };
                (name.to_string(), scaled)
            })
            .collect();

        TimeSeriesTable::from_columns(table.index().to_vec(), columns)
    }
}
