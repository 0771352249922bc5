//! Model-agnostic fit, score, and search machinery.

use std::collections::BTreeSet;
use std::collections::HashMap;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::application::cluster_input::{ClusterInput, FeatureMatrix};
use crate::application::models::{ModelFactory, ParamGrid, ParamSet};
use crate::application::transforms::TransformSequence;
use crate::domain::errors::ClusterError;
use crate::domain::labels::LabelMap;
use crate::domain::table::TimeSeriesTable;

/// Score function applied to a fitted labeling. Higher is better; callers
/// minimizing a dispersion metric supply its negation.
pub type ScoreFn = dyn Fn(&FeatureMatrix, &[String]) -> f64 + Send + Sync;

/// Build a model from `params`, fit it on `features`, and score the result.
pub fn compute_score(
    factory: &dyn ModelFactory,
    features: &FeatureMatrix,
    score: &ScoreFn,
    params: &ParamSet,
) -> Result<f64, ClusterError> {
    let model = factory.build(params)?;
    let labels = model.fit(features)?;
    Ok(score(features, &labels))
}

/// Winning configuration of a grid search.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GridSearchOutcome {
    pub best_params: ParamSet,
    pub best_score: f64,
    pub evaluated: usize,
}

/// Exhaustive search over a parameter grid.
///
/// Combinations are enumerated in the grid's key order and compared with
/// strict `>`, so the first combination seen at the best score wins. The
/// parallel variant reduces in enumeration order and therefore picks the
/// same winner as the sequential one, ties included.
pub struct GridSearch<'a> {
    factory: &'a dyn ModelFactory,
    grid: ParamGrid,
}

impl<'a> GridSearch<'a> {
    pub fn new(factory: &'a dyn ModelFactory, grid: ParamGrid) -> Self {
        Self { factory, grid }
    }

    pub fn run(
        &self,
        features: &FeatureMatrix,
        score: &ScoreFn,
    ) -> Result<GridSearchOutcome, ClusterError> {
        let combinations = self.grid.combinations();
        info!(
            "GridSearch: evaluating {} combinations of `{}`",
            combinations.len(),
            self.factory.name()
        );

        let mut scores = Vec::with_capacity(combinations.len());
        for params in &combinations {
            let value = compute_score(self.factory, features, score, params)?;
            debug!("GridSearch: {} -> {:.6}", params, value);
            scores.push(value);
        }

        Self::pick_best(combinations, scores)
    }

    /// Evaluate combinations on the rayon pool. Scores are collected back
    /// into enumeration order before the reduction.
    pub fn run_parallel(
        &self,
        features: &FeatureMatrix,
        score: &ScoreFn,
    ) -> Result<GridSearchOutcome, ClusterError> {
        let combinations = self.grid.combinations();
        info!(
            "GridSearch: evaluating {} combinations of `{}` in parallel",
            combinations.len(),
            self.factory.name()
        );

        let scores = combinations
            .par_iter()
            .map(|params| compute_score(self.factory, features, score, params))
            .collect::<Result<Vec<_>, _>>()?;

        Self::pick_best(combinations, scores)
    }

    fn pick_best(
        combinations: Vec<ParamSet>,
        scores: Vec<f64>,
    ) -> Result<GridSearchOutcome, ClusterError> {
        let evaluated = combinations.len();

        let mut best: Option<(ParamSet, f64)> = None;
        for (params, value) in combinations.into_iter().zip(scores) {
            let best_so_far = best.as_ref().map_or(f64::NEG_INFINITY, |(_, s)| *s);
            if value > best_so_far {
                best = Some((params, value));
            }
        }

        let (best_params, best_score) = best.ok_or_else(|| {
            ClusterError::validation("grid search evaluated no parameter combinations")
        })?;

        info!(
            "GridSearch: best score {:.6} at [{}]",
            best_score, best_params
        );

        Ok(GridSearchOutcome {
            best_params,
            best_score,
            evaluated,
        })
    }
}

/// Fit one model per coarse partition and merge the sub-labelings.
///
/// Columns are partitioned by `coarse`; each partition is transformed with
/// `sequence`, fitted with its own parameters from `params_by_group`, and
/// the fine labels are merged as `"<coarse> <fine>"`. The returned map
/// follows the input table's column order.
pub fn multi_cluster(
    factory: &dyn ModelFactory,
    table: &TimeSeriesTable,
    coarse: &LabelMap,
    params_by_group: &IndexMap<String, ParamSet>,
    sequence: &TransformSequence,
) -> Result<LabelMap, ClusterError> {
    let mut partitions: IndexMap<String, Vec<String>> = IndexMap::new();
    for symbol in table.symbols() {
        let label = coarse.get(&symbol).ok_or(ClusterError::MissingLabel {
            symbol: symbol.clone(),
        })?;
        partitions.entry(label.to_string()).or_default().push(symbol);
    }

    let partition_labels: BTreeSet<&str> = partitions.keys().map(String::as_str).collect();
    let param_keys: BTreeSet<&str> = params_by_group.keys().map(String::as_str).collect();
    if partition_labels != param_keys {
        let missing: Vec<&str> = partition_labels.difference(&param_keys).copied().collect();
        let extra: Vec<&str> = param_keys.difference(&partition_labels).copied().collect();
        return Err(ClusterError::PartitionMismatch {
            reason: format!(
                "labels without parameters: {:?}; parameters without labels: {:?}",
                missing, extra
            ),
        });
    }

    let mut merged: HashMap<String, String> = HashMap::with_capacity(table.n_cols());
    for (group, members) in &partitions {
        info!(
            "multi_cluster: fitting `{}` over {} assets in group `{}`",
            factory.name(),
            members.len(),
            group
        );

        let sub_table = table.select(members)?;
        let input = ClusterInput::build(&sub_table, sequence, false)?;
        let features = input.features();

        let model = factory.build(&params_by_group[group])?;
        let fine = model.fit(features)?;

        for (symbol, fine_label) in features.assets().iter().zip(fine) {
            merged.insert(symbol.clone(), format!("{} {}", group, fine_label));
        }
    }

    // Return in the original column order.
    Ok(table
        .symbols()
        .into_iter()
        .map(|symbol| {
            let label = merged.remove(&symbol).unwrap_or_default();
            (symbol, label)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::models::{ClusterModel, ParamValue};
    use chrono::NaiveDate;

    /// Test factory whose model labels every asset with the sum of the
    /// `a` and `b` parameters, so a score function can read the
    /// configuration back out of the labeling.
    struct ParamSumFactory;

    struct ParamSumModel {
        value: f64,
    }

    impl ModelFactory for ParamSumFactory {
        fn name(&self) -> &'static str {
            "param_sum"
        }

        fn build(&self, params: &ParamSet) -> Result<Box<dyn ClusterModel>, ClusterError> {
            let a = params.get("a").and_then(ParamValue::as_f64).unwrap_or(0.0);
            let b = params.get("b").and_then(ParamValue::as_f64).unwrap_or(0.0);
            Ok(Box::new(ParamSumModel { value: a + b }))
        }
    }

    impl ClusterModel for ParamSumModel {
        fn name(&self) -> &str {
            "param_sum"
        }

        fn fit(&self, features: &FeatureMatrix) -> Result<Vec<String>, ClusterError> {
            Ok(vec![self.value.to_string(); features.n_assets()])
        }
    }

    /// Constant-label model for partition merge tests.
    struct ZeroLabelFactory;

    struct ZeroLabelModel;

    impl ModelFactory for ZeroLabelFactory {
        fn name(&self) -> &'static str {
            "zero_label"
        }

        fn build(&self, _params: &ParamSet) -> Result<Box<dyn ClusterModel>, ClusterError> {
            Ok(Box::new(ZeroLabelModel))
        }
    }

    impl ClusterModel for ZeroLabelModel {
        fn name(&self) -> &str {
            "zero_label"
        }

        fn fit(&self, features: &FeatureMatrix) -> Result<Vec<String>, ClusterError> {
            Ok(vec!["0".to_string(); features.n_assets()])
        }
    }

    fn table() -> TimeSeriesTable {
        let index = (0..3)
            .map(|i| NaiveDate::from_ymd_opt(2024, 8, 5).unwrap() + chrono::Days::new(i))
            .collect();
        let mut columns = indexmap::IndexMap::new();
        columns.insert("XOM".to_string(), vec![1.0, 2.0, 3.0]);
        columns.insert("AAPL".to_string(), vec![4.0, 5.0, 6.0]);
        columns.insert("CVX".to_string(), vec![7.0, 8.0, 9.0]);
        TimeSeriesTable::from_columns(index, columns).unwrap()
    }

    fn label_score(_features: &FeatureMatrix, labels: &[String]) -> f64 {
        labels[0].parse().unwrap()
    }

    #[test]
    fn test_grid_search_picks_maximum() {
        let mut grid = ParamGrid::new();
        grid.insert("a", vec![1i64.into(), 2i64.into()]);
        grid.insert("b", vec![10i64.into(), 20i64.into()]);

        let features = FeatureMatrix::from_table(&table());
        let outcome = GridSearch::new(&ParamSumFactory, grid)
            .run(&features, &label_score)
            .unwrap();

        assert_eq!(outcome.evaluated, 4);
        assert_eq!(outcome.best_score, 22.0);
        assert_eq!(outcome.best_params.get("a"), Some(&ParamValue::Int(2)));
        assert_eq!(outcome.best_params.get("b"), Some(&ParamValue::Int(20)));
    }

    fn constant_score(_features: &FeatureMatrix, _labels: &[String]) -> f64 {
        1.0
    }

    #[test]
    fn test_grid_search_first_seen_wins_on_ties() {
        let mut grid = ParamGrid::new();
        grid.insert("a", vec![5i64.into(), 3i64.into()]);
        grid.insert("b", vec![0i64.into(), 2i64.into()]);

        // Every combination ties, so the first one enumerated wins.
        let features = FeatureMatrix::from_table(&table());
        let search = GridSearch::new(&ParamSumFactory, grid);

        let outcome = search.run(&features, &constant_score).unwrap();
        assert_eq!(outcome.best_params.get("a"), Some(&ParamValue::Int(5)));
        assert_eq!(outcome.best_params.get("b"), Some(&ParamValue::Int(0)));

        let parallel = search.run_parallel(&features, &constant_score).unwrap();
        assert_eq!(parallel.best_params, outcome.best_params);
        assert_eq!(parallel.best_score, outcome.best_score);
    }

    #[test]
    fn test_compute_score_propagates_build_failure() {
        let features = FeatureMatrix::from_table(&table());
        let factory = crate::application::models::KMeansFactory;
        let result = compute_score(&factory, &features, &label_score, &ParamSet::new());
        assert!(matches!(result, Err(ClusterError::Configuration { .. })));
    }

    #[test]
    fn test_multi_cluster_merges_in_column_order() {
        let table = table();

        let mut coarse = LabelMap::new();
        coarse.insert("XOM", "Energy");
        coarse.insert("AAPL", "Tech");
        coarse.insert("CVX", "Energy");

        let mut params = IndexMap::new();
        params.insert("Energy".to_string(), ParamSet::new());
        params.insert("Tech".to_string(), ParamSet::new());

        let merged = multi_cluster(
            &ZeroLabelFactory,
            &table,
            &coarse,
            &params,
            &TransformSequence::identity(),
        )
        .unwrap();

        assert_eq!(merged.symbols(), vec!["XOM", "AAPL", "CVX"]);
        assert_eq!(merged.get("XOM"), Some("Energy 0"));
        assert_eq!(merged.get("AAPL"), Some("Tech 0"));
        assert_eq!(merged.get("CVX"), Some("Energy 0"));
    }

    #[test]
    fn test_multi_cluster_partition_mismatch() {
        let table = table();

        let mut coarse = LabelMap::new();
        coarse.insert("XOM", "Energy");
        coarse.insert("AAPL", "Tech");
        coarse.insert("CVX", "Energy");

        let mut params = IndexMap::new();
        params.insert("Energy".to_string(), ParamSet::new());

        let result = multi_cluster(
            &ZeroLabelFactory,
            &table,
            &coarse,
            &params,
            &TransformSequence::identity(),
        );
        assert!(matches!(result, Err(ClusterError::PartitionMismatch { .. })));
    }

    #[test]
    fn test_multi_cluster_missing_coarse_label() {
        let table = table();

        let mut coarse = LabelMap::new();
        coarse.insert("XOM", "Energy");

        let result = multi_cluster(
            &ZeroLabelFactory,
            &table,
            &coarse,
            &IndexMap::new(),
            &TransformSequence::identity(),
        );
        assert!(matches!(result, Err(ClusterError::MissingLabel { .. })));
    }
}
