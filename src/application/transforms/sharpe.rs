use indexmap::IndexMap;
use statrs::statistics::{Data, Distribution};

use super::{RateOfReturn, RollingRisk, Transform};
use crate::domain::errors::ClusterError;
use crate::domain::table::TimeSeriesTable;

/// Sharpe-style normalization of a price table.
///
/// Computes returns, subtracts the cross-sectional mean return at each row
/// (the risk-free proxy), and divides by a dispersion estimate: a per-asset
/// constant over the whole return history when no window is given, or the
/// rolling risk estimate when one is. With a window the result is `window`
/// rows shorter than plain mean-subtraction would be.
pub struct SharpeNormalize {
    window: Option<usize>,
}

impl SharpeNormalize {
    pub fn constant_risk() -> Self {
        Self { window: None }
    }

    pub fn rolling_risk(window: usize) -> Self {
        Self {
            window: Some(window),
        }
    }
}

impl Transform for SharpeNormalize {
    fn name(&self) -> &'static str {
        "sharpe_normalize"
    }

    fn validate(&self) -> Result<(), ClusterError> {
        if let Some(window) = self.window {
            if window < 2 {
                return Err(ClusterError::configuration(format!(
                    "risk window must be at least 2, got {}",
                    window
                )));
            }
        }
        Ok(())
    }

    fn apply(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable, ClusterError> {
        self.validate()?;

        let returns = RateOfReturn.apply(table)?;
        let means = returns.row_means();

        match self.window {
            None => {
                let mut columns = IndexMap::with_capacity(returns.n_cols());
                for (name, values) in returns.iter_columns() {
                    let sigma = Data::new(values.to_vec()).std_dev().ok_or_else(|| {
                        ClusterError::validation(format!(
                            "return history of `{}` too short for a dispersion estimate",
                            name
                        ))
                    })?;
                    let normalized = values
                        .iter()
                        .zip(&means)
                        .map(|(r, m)| (r - m) / sigma)
                        .collect::<Vec<_>>();
                    columns.insert(name.to_string(), normalized);
                }
                TimeSeriesTable::from_columns(returns.index().to_vec(), columns)
            }
            Some(window) => {
                let risk = RollingRisk::new(window).apply(&returns)?;

                let mut columns = IndexMap::with_capacity(returns.n_cols());
                for (name, values) in returns.iter_columns() {
                    let sigmas = risk.column(name).ok_or_else(|| {
                        ClusterError::validation(format!(
                            "no risk estimate for column `{}`",
                            name
                        ))
                    })?;
                    let normalized = sigmas
                        .iter()
                        .enumerate()
                        .map(|(i, sigma)| {
                            let t = i + window;
                            (values[t] - means[t]) / sigma
                        })
                        .collect::<Vec<_>>();
                    columns.insert(name.to_string(), normalized);
                }
                TimeSeriesTable::from_columns(risk.index().to_vec(), columns)
            }
        }
    }
}
