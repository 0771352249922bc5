use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::domain::errors::ClusterError;
use crate::domain::labels::LabelMap;
use crate::domain::table::TimeSeriesTable;

/// Ground-truth classification scheme offered by the reference taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Sector,
    SubIndustry,
}

impl FromStr for Scheme {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sector" => Ok(Scheme::Sector),
            "sub-industry" | "subindustry" => Ok(Scheme::SubIndustry),
            _ => Err(ClusterError::configuration(format!(
                "unknown classification scheme `{}`; expected 'sector' or 'sub-industry'",
                s
            ))),
        }
    }
}

/// Read-only view of a reference taxonomy mapping assets to groups.
///
/// Implementations may cache the underlying table for the process lifetime;
/// every query returns a fresh derived map.
pub trait ClassificationProvider: Send + Sync {
    /// All known asset symbols, in source-table order.
    fn identifiers(&self) -> Vec<String>;

    /// Symbol -> group label under `scheme`.
    fn identifier_to_group(&self, scheme: Scheme) -> LabelMap;

    /// Group label -> member symbols under `scheme`.
    fn group_to_identifiers(&self, scheme: Scheme) -> IndexMap<String, BTreeSet<String>>;
}

/// Source of historical price tables.
#[async_trait]
pub trait PriceHistory: Send + Sync {
    /// Fetch one price column per requested symbol over `[start, end]`.
    ///
    /// Failures surface as `DataUnavailable`; the caller decides whether to
    /// retry.
    async fn fetch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeriesTable, ClusterError>;
}
