use indexmap::IndexMap;
use statrs::statistics::{Data, Distribution};

use super::Transform;
use crate::domain::errors::ClusterError;
use crate::domain::table::TimeSeriesTable;

/// Rolling dispersion estimate over a trailing window.
///
/// At row `t` the output is the sample standard deviation of the `window`
/// observations ending at `t`, scaled by `sqrt(w / (w - 1))`. Rows with
/// fewer than `window` prior observations produce no output row, so the
/// result is `window` rows shorter than the input.
pub struct RollingRisk {
    window: usize,
}

impl RollingRisk {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Transform for RollingRisk {
    fn name(&self) -> &'static str {
        "rolling_risk"
    }

    fn validate(&self) -> Result<(), ClusterError> {
        if self.window < 2 {
            return Err(ClusterError::configuration(format!(
                "window must be at least 2, got {}",
                self.window
            )));
        }
        Ok(())
    }

    fn apply(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable, ClusterError> {
        self.validate()?;

        let w = self.window;
        let scale = (w as f64 / (w as f64 - 1.0)).sqrt();
        let n = table.n_rows();

        let index = if n <= w {
            Vec::new()
        } else {
            table.index()[w..].to_vec()
        };

        let mut columns = IndexMap::with_capacity(table.n_cols());
        for (name, values) in table.iter_columns() {
            let mut out = Vec::with_capacity(n.saturating_sub(w));
            for t in w..n {
                let trailing = values[t + 1 - w..=t].to_vec();
                let std = Data::new(trailing).std_dev().ok_or_else(|| {
                    ClusterError::validation(format!(
                        "standard deviation undefined for `{}` at row {}",
                        name, t
                    ))
                })?;
                out.push(std * scale);
            }
            columns.insert(name.to_string(), out);
        }

        TimeSeriesTable::from_columns(index, columns)
    }
}
