//! Canonical clustering input: one observation vector per asset.

use serde::{Deserialize, Serialize};

use crate::application::transforms::TransformSequence;
use crate::application::transforms::normalize::l2_norm;
use crate::domain::errors::ClusterError;
use crate::domain::table::TimeSeriesTable;

/// Feature matrix with one row per asset, one column per time observation.
///
/// Row labels are the source table's column labels in original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    assets: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Transpose a table so each asset's series becomes a row.
    pub fn from_table(table: &TimeSeriesTable) -> Self {
        let assets = table.symbols();
        let rows = table
            .iter_columns()
            .map(|(_, values)| values.to_vec())
            .collect();
        Self { assets, rows }
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn n_assets(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, asset: usize) -> &[f64] {
        &self.rows[asset]
    }

    fn normalize_rows(&mut self) {
        for row in &mut self.rows {
            let norm = l2_norm(row);
            if norm > 0.0 {
                for v in row.iter_mut() {
                    *v /= norm;
                }
            }
        }
    }
}

/// Transformed, model-ready clustering input. Immutable once built.
#[derive(Debug, Clone)]
pub struct ClusterInput {
    features: FeatureMatrix,
}

impl ClusterInput {
    /// Validate the table, run it through `sequence`, and orient the result
    /// so clustering models receive one row per asset. Set `normalize_rows`
    /// to L2-normalize each asset vector after orientation.
    pub fn build(
        table: &TimeSeriesTable,
        sequence: &TransformSequence,
        normalize_rows: bool,
    ) -> Result<Self, ClusterError> {
        validate_input(table)?;

        let transformed = sequence.apply(table)?;
        if transformed.is_empty() {
            return Err(ClusterError::validation(
                "transform sequence produced an empty table",
            ));
        }

        let mut features = FeatureMatrix::from_table(&transformed);
        if normalize_rows {
            features.normalize_rows();
        }

        Ok(Self { features })
    }

    /// The un-oriented variant: validate and transform, but keep time as
    /// the row axis. For callers that want the table itself.
    pub fn transform_only(
        table: &TimeSeriesTable,
        sequence: &TransformSequence,
    ) -> Result<TimeSeriesTable, ClusterError> {
        validate_input(table)?;
        sequence.apply(table)
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    pub fn into_features(self) -> FeatureMatrix {
        self.features
    }
}

fn validate_input(table: &TimeSeriesTable) -> Result<(), ClusterError> {
    if table.is_empty() {
        return Err(ClusterError::validation(
            "input table has no rows or no columns",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use indexmap::IndexMap;

    fn price_table() -> TimeSeriesTable {
        let index = (0..5)
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 8).unwrap() + chrono::Days::new(i))
            .collect();
        let mut columns = IndexMap::new();
        columns.insert("AAA".to_string(), vec![10.0, 11.0, 12.1, 11.5, 12.0]);
        columns.insert("BBB".to_string(), vec![20.0, 19.0, 19.5, 21.0, 20.5]);
        TimeSeriesTable::from_columns(index, columns).unwrap()
    }

    #[test]
    fn test_row_labels_equal_original_columns() {
        let input =
            ClusterInput::build(&price_table(), &TransformSequence::identity(), false).unwrap();
        let features = input.features();

        assert_eq!(features.assets(), &["AAA", "BBB"]);
        assert_eq!(features.n_assets(), 2);
        assert_eq!(features.n_features(), 5);
        assert_eq!(features.row(0), &[10.0, 11.0, 12.1, 11.5, 12.0]);
    }

    #[test]
    fn test_row_normalization() {
        let input =
            ClusterInput::build(&price_table(), &TransformSequence::identity(), true).unwrap();

        for row in input.features().rows() {
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_table_rejected() {
        let table = TimeSeriesTable::from_columns(Vec::new(), IndexMap::new()).unwrap();
        let result = ClusterInput::build(&table, &TransformSequence::identity(), false);
        assert!(matches!(result, Err(ClusterError::Validation { .. })));
    }

    #[test]
    fn test_transform_only_keeps_time_rows() {
        let table = price_table();
        let out = ClusterInput::transform_only(&table, &TransformSequence::identity()).unwrap();
        assert_eq!(out.n_rows(), table.n_rows());
        assert_eq!(out.symbols(), table.symbols());
    }
}
