use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::errors::ClusterError;

/// Date-indexed table of per-asset value series.
///
/// Columns are keyed by asset symbol and iterate in insertion order, which
/// keeps partition merges and exported labelings deterministic. All columns
/// share the index; the index is strictly increasing. Missing observations
/// are `f64::NAN` and only exist before a transform stage has dropped them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesTable {
    index: Vec<NaiveDate>,
    columns: IndexMap<String, Vec<f64>>,
}

impl TimeSeriesTable {
    /// Build a table from an index and named columns.
    ///
    /// Fails with `Validation` if any column length differs from the index
    /// length or the index is not strictly increasing.
    pub fn from_columns(
        index: Vec<NaiveDate>,
        columns: IndexMap<String, Vec<f64>>,
    ) -> Result<Self, ClusterError> {
        for (symbol, values) in &columns {
            if values.len() != index.len() {
                return Err(ClusterError::validation(format!(
                    "column `{}` has {} rows, index has {}",
                    symbol,
                    values.len(),
                    index.len()
                )));
            }
        }

        if let Some(pair) = index.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ClusterError::validation(format!(
                "index is not strictly increasing at {}",
                pair[1]
            )));
        }

        Ok(Self { index, columns })
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    /// Asset symbols in column order.
    pub fn symbols(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    pub fn has_column(&self, symbol: &str) -> bool {
        self.columns.contains_key(symbol)
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.columns.get(symbol).map(Vec::as_slice)
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Values at row `row` in column order.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.columns.values().map(|values| values[row]).collect()
    }

    /// Cross-sectional mean (over assets) at every row.
    pub fn row_means(&self) -> Vec<f64> {
        let n = self.n_cols() as f64;
        (0..self.n_rows())
            .map(|row| self.columns.values().map(|values| values[row]).sum::<f64>() / n)
            .collect()
    }

    /// Sub-table holding only `symbols`, in the given order.
    ///
    /// Fails with `Validation` when a requested symbol is not a column.
    pub fn select(&self, symbols: &[String]) -> Result<Self, ClusterError> {
        let mut columns = IndexMap::with_capacity(symbols.len());
        for symbol in symbols {
            let values = self.columns.get(symbol).ok_or_else(|| {
                ClusterError::validation(format!("unknown column `{}`", symbol))
            })?;
            columns.insert(symbol.clone(), values.clone());
        }

        Ok(Self {
            index: self.index.clone(),
            columns,
        })
    }

    /// Drop every column containing an unresolvable (NaN) value.
    pub fn drop_unresolved_columns(&self) -> Self {
        let columns: IndexMap<String, Vec<f64>> = self
            .columns
            .iter()
            .filter(|(_, values)| !values.iter().any(|v| v.is_nan()))
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect();

        Self {
            index: self.index.clone(),
            columns,
        }
    }

    /// True when no value in the table is NaN.
    pub fn is_complete(&self) -> bool {
        self.columns
            .values()
            .all(|values| values.iter().all(|v| !v.is_nan()))
    }
}
