use indexmap::IndexMap;

use super::Transform;
use crate::domain::errors::ClusterError;
use crate::domain::table::TimeSeriesTable;

/// Simple rate of return: `r[t] = p[t] / p[t-1] - 1`.
///
/// Columns containing unresolvable values are dropped before returns are
/// computed; the first row is dropped after, since it has no prior value.
pub struct RateOfReturn;

impl Transform for RateOfReturn {
    fn name(&self) -> &'static str {
        "rate_of_return"
    }

    fn apply(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable, ClusterError> {
        let complete = table.drop_unresolved_columns();

        let index = if complete.n_rows() < 2 {
            Vec::new()
        } else {
            complete.index()[1..].to_vec()
        };

        let columns: IndexMap<String, Vec<f64>> = complete
            .iter_columns()
            .map(|(name, prices)| {
                let returns = prices
                    .windows(2)
                    .map(|w| w[1] / w[0] - 1.0)
                    .collect::<Vec<_>>();
                (name.to_string(), returns)
            })
            .collect();

        TimeSeriesTable::from_columns(index, columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn price_table() -> TimeSeriesTable {
        let index = (0..4)
            .map(|i| NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Days::new(i))
            .collect();
        let mut columns = IndexMap::new();
        columns.insert("AAA".to_string(), vec![100.0, 110.0, 99.0, 99.0]);
        columns.insert("BBB".to_string(), vec![50.0, f64::NAN, 55.0, 60.0]);
        TimeSeriesTable::from_columns(index, columns).unwrap()
    }

    #[test]
    fn test_returns_drop_first_row_and_incomplete_columns() {
        let returns = RateOfReturn.apply(&price_table()).unwrap();

        assert_eq!(returns.symbols(), vec!["AAA"]);
        assert_eq!(returns.n_rows(), 3);

        let r = returns.column("AAA").unwrap();
        assert!((r[0] - 0.10).abs() < 1e-12);
        assert!((r[1] - (99.0 / 110.0 - 1.0)).abs() < 1e-12);
        assert_eq!(r[2], 0.0);
    }

    #[test]
    fn test_returns_undifference_to_prices() {
        let index = (0..5)
            .map(|i| NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Days::new(i))
            .collect::<Vec<_>>();
        let prices = vec![100.0, 103.0, 101.5, 108.2, 107.0];
        let mut columns = IndexMap::new();
        columns.insert("AAA".to_string(), prices.clone());
        let table = TimeSeriesTable::from_columns(index, columns).unwrap();

        let returns = RateOfReturn.apply(&table).unwrap();
        let r = returns.column("AAA").unwrap();

        // Cumulative product of 1 + r reconstructs the series past row 0.
        let mut rebuilt = prices[0];
        for (i, ret) in r.iter().enumerate() {
            rebuilt *= 1.0 + ret;
            assert!((rebuilt - prices[i + 1]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_row_yields_empty_table() {
        let index = vec![NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()];
        let mut columns = IndexMap::new();
        columns.insert("AAA".to_string(), vec![100.0]);
        let table = TimeSeriesTable::from_columns(index, columns).unwrap();

        let returns = RateOfReturn.apply(&table).unwrap();
        assert_eq!(returns.n_rows(), 0);
    }
}
