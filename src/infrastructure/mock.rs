//! Mock implementations for tests and offline runs.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::application::cluster_input::FeatureMatrix;
use crate::application::models::{ClusterModel, ModelFactory, ParamSet};
use crate::domain::errors::ClusterError;
use crate::domain::labels::LabelMap;
use crate::domain::ports::{ClassificationProvider, PriceHistory, Scheme};
use crate::domain::table::TimeSeriesTable;

/// Fixed in-memory taxonomy.
pub struct MockClassificationProvider {
    rows: Vec<(String, String, String)>,
}

impl MockClassificationProvider {
    /// `rows` are (symbol, sector, sub-industry) triples.
    pub fn new(rows: Vec<(String, String, String)>) -> Self {
        Self { rows }
    }
}

impl ClassificationProvider for MockClassificationProvider {
    fn identifiers(&self) -> Vec<String> {
        self.rows.iter().map(|(s, _, _)| s.clone()).collect()
    }

    fn identifier_to_group(&self, scheme: Scheme) -> LabelMap {
        self.rows
            .iter()
            .map(|(symbol, sector, subind)| {
                let group = match scheme {
                    Scheme::Sector => sector,
                    Scheme::SubIndustry => subind,
                };
                (symbol.clone(), group.clone())
            })
            .collect()
    }

    fn group_to_identifiers(&self, scheme: Scheme) -> IndexMap<String, BTreeSet<String>> {
        let forward = self.identifier_to_group(scheme);
        let mut groups: IndexMap<String, BTreeSet<String>> = IndexMap::new();
        for (symbol, label) in forward.iter() {
            groups
                .entry(label.to_string())
                .or_default()
                .insert(symbol.to_string());
        }
        groups
    }
}

/// Price source returning a canned table, counting fetches.
pub struct MockPriceHistory {
    table: TimeSeriesTable,
    fetches: AtomicUsize,
}

impl MockPriceHistory {
    pub fn new(table: TimeSeriesTable) -> Self {
        Self {
            table,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceHistory for MockPriceHistory {
    async fn fetch(
        &self,
        _symbols: &[String],
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<TimeSeriesTable, ClusterError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.table.clone())
    }
}

/// Model assigning the same label to every asset. Deterministic by
/// construction, which makes merged labelings easy to assert on.
pub struct ConstantLabelFactory {
    label: String,
}

impl ConstantLabelFactory {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ModelFactory for ConstantLabelFactory {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn build(&self, _params: &ParamSet) -> Result<Box<dyn ClusterModel>, ClusterError> {
        Ok(Box::new(ConstantLabelModel {
            label: self.label.clone(),
        }))
    }
}

struct ConstantLabelModel {
    label: String,
}

impl ClusterModel for ConstantLabelModel {
    fn name(&self) -> &str {
        "constant"
    }

    fn fit(&self, features: &FeatureMatrix) -> Result<Vec<String>, ClusterError> {
        Ok(vec![self.label.clone(); features.n_assets()])
    }
}
