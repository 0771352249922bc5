//! Reference taxonomy backed by an index-constituent table.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::info;

use crate::domain::errors::ClusterError;
use crate::domain::labels::LabelMap;
use crate::domain::ports::{ClassificationProvider, Scheme};

#[derive(Debug, Clone, Deserialize)]
struct ConstituentRow {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "GICS Sector")]
    sector: String,
    #[serde(rename = "GICS Sub-Industry")]
    sub_industry: String,
}

/// In-process copy of the constituent table.
///
/// The table is parsed once at construction; every query derives a fresh
/// read-only map from it.
pub struct ConstituentDirectory {
    rows: Vec<ConstituentRow>,
}

impl ConstituentDirectory {
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ClusterError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let rows = csv_reader
            .deserialize()
            .collect::<Result<Vec<ConstituentRow>, _>>()
            .map_err(|e| {
                ClusterError::data_unavailable(format!("malformed constituent table: {}", e))
            })?;

        if rows.is_empty() {
            return Err(ClusterError::data_unavailable(
                "constituent table has no rows",
            ));
        }

        Ok(Self { rows })
    }

    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, ClusterError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            ClusterError::data_unavailable(format!(
                "cannot open constituent table {}: {}",
                path.display(),
                e
            ))
        })?;

        info!("Loading constituent table from {}", path.display());
        Self::from_csv_reader(file)
    }

    /// Download the table from a CSV endpoint.
    pub async fn fetch(url: &str) -> Result<Self, ClusterError> {
        info!("Fetching constituent table from {}", url);

        let response = reqwest::get(url).await.map_err(|e| {
            ClusterError::data_unavailable(format!("constituent fetch failed: {}", e))
        })?;
        let body = response.error_for_status().map_err(|e| {
            ClusterError::data_unavailable(format!("constituent fetch failed: {}", e))
        })?;
        let text = body.text().await.map_err(|e| {
            ClusterError::data_unavailable(format!("constituent fetch failed: {}", e))
        })?;

        Self::from_csv_reader(text.as_bytes())
    }

    fn group_of(row: &ConstituentRow, scheme: Scheme) -> &str {
        match scheme {
            Scheme::Sector => &row.sector,
            Scheme::SubIndustry => &row.sub_industry,
        }
    }
}

impl ClassificationProvider for ConstituentDirectory {
    fn identifiers(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.symbol.clone()).collect()
    }

    fn identifier_to_group(&self, scheme: Scheme) -> LabelMap {
        self.rows
            .iter()
            .map(|r| (r.symbol.clone(), Self::group_of(r, scheme).to_string()))
            .collect()
    }

    fn group_to_identifiers(&self, scheme: Scheme) -> IndexMap<String, BTreeSet<String>> {
        let mut groups: IndexMap<String, BTreeSet<String>> = IndexMap::new();
        for row in &self.rows {
            groups
                .entry(Self::group_of(row, scheme).to_string())
                .or_default()
                .insert(row.symbol.clone());
        }
        groups
    }
}
