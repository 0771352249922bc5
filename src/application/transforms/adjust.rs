use indexmap::IndexMap;

use super::Transform;
use crate::domain::errors::ClusterError;
use crate::domain::labels::LabelMap;
use crate::domain::table::TimeSeriesTable;

/// Subtract the cross-sectional mean over all assets at each row.
pub struct MarketAdjust;

impl Transform for MarketAdjust {
    fn name(&self) -> &'static str {
        "market_adjust"
    }

    fn apply(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable, ClusterError> {
        let means = table.row_means();

        let columns: IndexMap<String, Vec<f64>> = table
            .iter_columns()
            .map(|(name, values)| {
                let adjusted = values
                    .iter()
                    .zip(&means)
                    .map(|(v, m)| v - m)
                    .collect::<Vec<_>>();
                (name.to_string(), adjusted)
            })
            .collect();

        TimeSeriesTable::from_columns(table.index().to_vec(), columns)
    }
}

/// Subtract each group's own cross-sectional mean at each row.
///
/// Every column of the table must appear in the label map; the first
/// unlabeled symbol aborts the transform with `MissingLabel`.
pub struct IndustryAdjust {
    labels: LabelMap,
}

impl IndustryAdjust {
    pub fn new(labels: LabelMap) -> Self {
        Self { labels }
    }
}

impl Transform for IndustryAdjust {
    fn name(&self) -> &'static str {
        "industry_adjust"
    }

    fn apply(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable, ClusterError> {
        // Group columns before computing anything.
        let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
        for symbol in table.symbols() {
            let label = self
                .labels
                .get(&symbol)
                .ok_or(ClusterError::MissingLabel {
                    symbol: symbol.clone(),
                })?;
            groups.entry(label.to_string()).or_default().push(symbol);
        }

        let mut adjusted: IndexMap<String, Vec<f64>> = IndexMap::with_capacity(table.n_cols());
        for members in groups.values() {
            let group = table.select(members)?;
            let means = group.row_means();
            for (name, values) in group.iter_columns() {
                let centered = values
                    .iter()
                    .zip(&means)
                    .map(|(v, m)| v - m)
                    .collect::<Vec<_>>();
                adjusted.insert(name.to_string(), centered);
            }
        }

        // Restore the input's column order.
        let columns: IndexMap<String, Vec<f64>> = table
            .symbols()
            .into_iter()
            .map(|symbol| {
                let values = adjusted.shift_remove(&symbol).unwrap_or_default();
                (symbol, values)
            })
            .collect();

        TimeSeriesTable::from_columns(table.index().to_vec(), columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table() -> TimeSeriesTable {
        let index = (0..3)
            .map(|i| NaiveDate::from_ymd_opt(2024, 6, 3).unwrap() + chrono::Days::new(i))
            .collect();
        let mut columns = IndexMap::new();
        columns.insert("XOM".to_string(), vec![1.0, 2.0, 3.0]);
        columns.insert("CVX".to_string(), vec![3.0, 4.0, 5.0]);
        columns.insert("AAPL".to_string(), vec![10.0, 20.0, 30.0]);
        TimeSeriesTable::from_columns(index, columns).unwrap()
    }

    fn sector_labels() -> LabelMap {
        let mut labels = LabelMap::new();
        labels.insert("XOM", "Energy");
        labels.insert("CVX", "Energy");
        labels.insert("AAPL", "Tech");
        labels
    }

    #[test]
    fn test_market_adjust_zeroes_row_means() {
        let adjusted = MarketAdjust.apply(&table()).unwrap();
        for mean in adjusted.row_means() {
            assert!(mean.abs() < 1e-12);
        }
    }

    #[test]
    fn test_market_adjust_no_row_loss() {
        let input = table();
        let adjusted = MarketAdjust.apply(&input).unwrap();
        assert_eq!(adjusted.n_rows(), input.n_rows());
        assert_eq!(adjusted.symbols(), input.symbols());
    }

    #[test]
    fn test_industry_adjust_zeroes_group_means() {
        let labels = sector_labels();
        let adjusted = IndustryAdjust::new(labels.clone()).apply(&table()).unwrap();

        for label in labels.distinct_labels() {
            let group = adjusted.select(&labels.members(&label)).unwrap();
            for mean in group.row_means() {
                assert!(mean.abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_industry_adjust_preserves_column_order() {
        let adjusted = IndustryAdjust::new(sector_labels())
            .apply(&table())
            .unwrap();
        assert_eq!(adjusted.symbols(), vec!["XOM", "CVX", "AAPL"]);
    }

    #[test]
    fn test_industry_adjust_missing_label() {
        let mut labels = LabelMap::new();
        labels.insert("XOM", "Energy");
        labels.insert("CVX", "Energy");

        let result = IndustryAdjust::new(labels).apply(&table());
        match result {
            Err(ClusterError::MissingLabel { symbol }) => assert_eq!(symbol, "AAPL"),
            other => panic!("expected MissingLabel, got {:?}", other.map(|_| ())),
        }
    }
}
