//! Composable transforms from price tables to clustering-ready features.
//!
//! Each transform is a small config struct implementing [`Transform`]; a
//! [`TransformSequence`] composes them in caller order. Configuration is
//! checked when the sequence is built, before any data flows through it.

pub mod adjust;
pub mod normalize;
pub mod returns;
pub mod risk;
pub mod sharpe;

pub use adjust::{IndustryAdjust, MarketAdjust};
pub use normalize::L2Normalize;
pub use returns::RateOfReturn;
pub use risk::RollingRisk;
pub use sharpe::SharpeNormalize;

use crate::domain::errors::ClusterError;
use crate::domain::labels::LabelMap;
use crate::domain::table::TimeSeriesTable;

/// A pure table-to-table transformation with configuration fixed at
/// construction time.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    /// Check the fixed configuration. Run by [`TransformSequence::new`]
    /// before any data is touched.
    fn validate(&self) -> Result<(), ClusterError> {
        Ok(())
    }

    /// Apply the transformation, leaving the input untouched.
    fn apply(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable, ClusterError>;
}

/// Ordered list of transforms applied as `f_n(...f_2(f_1(table)))`.
pub struct TransformSequence {
    steps: Vec<Box<dyn Transform>>,
}

impl TransformSequence {
    /// Build a sequence, validating every step's configuration up front.
    pub fn new(steps: Vec<Box<dyn Transform>>) -> Result<Self, ClusterError> {
        for step in &steps {
            step.validate().map_err(|e| match e {
                ClusterError::Configuration { reason } => ClusterError::configuration(format!(
                    "transform `{}`: {}",
                    step.name(),
                    reason
                )),
                other => other,
            })?;
        }
        Ok(Self { steps })
    }

    /// The default analytical pipeline: rate-of-return, market adjustment,
    /// then industry adjustment against `sector_labels`.
    pub fn canonical(sector_labels: LabelMap) -> Result<Self, ClusterError> {
        Self::new(vec![
            Box::new(RateOfReturn),
            Box::new(MarketAdjust),
            Box::new(IndustryAdjust::new(sector_labels)),
        ])
    }

    /// A sequence that passes the table through unchanged.
    pub fn identity() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run the table through every step in list order.
    pub fn apply(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable, ClusterError> {
        let mut current = table.clone();
        for step in &self.steps {
            current = step.apply(&current)?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use indexmap::IndexMap;

    struct AddOne;
    struct Double;

    impl Transform for AddOne {
        fn name(&self) -> &'static str {
            "add_one"
        }

        fn apply(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable, ClusterError> {
            let columns = table
                .iter_columns()
                .map(|(name, values)| {
                    (
                        name.to_string(),
                        values.iter().map(|v| v + 1.0).collect::<Vec<_>>(),
                    )
                })
                .collect();
            TimeSeriesTable::from_columns(table.index().to_vec(), columns)
        }
    }

    impl Transform for Double {
        fn name(&self) -> &'static str {
            "double"
        }

        fn apply(&self, table: &TimeSeriesTable) -> Result<TimeSeriesTable, ClusterError> {
            let columns = table
                .iter_columns()
                .map(|(name, values)| {
                    (
                        name.to_string(),
                        values.iter().map(|v| v * 2.0).collect::<Vec<_>>(),
                    )
                })
                .collect();
            TimeSeriesTable::from_columns(table.index().to_vec(), columns)
        }
    }

    fn one_column_table(values: Vec<f64>) -> TimeSeriesTable {
        let index = (0..values.len())
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(i as u64))
            .collect();
        let mut columns = IndexMap::new();
        columns.insert("AAA".to_string(), values);
        TimeSeriesTable::from_columns(index, columns).unwrap()
    }

    #[test]
    fn test_composition_is_in_list_order() {
        let table = one_column_table(vec![1.0, 2.0]);

        // double(add_one(x)) = (x + 1) * 2
        let seq = TransformSequence::new(vec![Box::new(AddOne), Box::new(Double)]).unwrap();
        let out = seq.apply(&table).unwrap();
        assert_eq!(out.column("AAA").unwrap(), &[4.0, 6.0]);

        // add_one(double(x)) = x * 2 + 1
        let seq = TransformSequence::new(vec![Box::new(Double), Box::new(AddOne)]).unwrap();
        let out = seq.apply(&table).unwrap();
        assert_eq!(out.column("AAA").unwrap(), &[3.0, 5.0]);
    }

    #[test]
    fn test_identity_sequence() {
        let table = one_column_table(vec![1.0, 2.0]);
        let out = TransformSequence::identity().apply(&table).unwrap();
        assert_eq!(out, table);
    }

    #[test]
    fn test_invalid_step_rejected_before_any_data() {
        let result = TransformSequence::new(vec![
            Box::new(RateOfReturn),
            Box::new(RollingRisk::new(1)),
        ]);

        match result {
            Err(ClusterError::Configuration { reason }) => {
                assert!(reason.contains("rolling_risk"));
            }
            other => panic!("expected Configuration error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_canonical_pipeline_shape() {
        let mut labels = LabelMap::new();
        labels.insert("AAA", "Energy");

        let seq = TransformSequence::canonical(labels).unwrap();
        assert_eq!(
            seq.names(),
            vec!["rate_of_return", "market_adjust", "industry_adjust"]
        );
    }
}
