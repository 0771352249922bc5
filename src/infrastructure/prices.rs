//! Historical price retrieval and its on-disk cache.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::domain::errors::ClusterError;
use crate::domain::ports::PriceHistory;
use crate::domain::table::TimeSeriesTable;

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Close")]
    close: f64,
}

/// Connector for CSV-per-symbol price endpoints.
///
/// The URL template takes `{symbol}`, `{start}` and `{end}` placeholders;
/// dates are substituted as `YYYYMMDD`. Columns are merged on the union of
/// trading dates, leaving NaN where a symbol has no observation; downstream
/// transforms drop incomplete columns.
pub struct CsvPriceHistory {
    client: reqwest::Client,
    url_template: String,
}

impl CsvPriceHistory {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url_template: url_template.into(),
        }
    }

    async fn fetch_one(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, f64>, ClusterError> {
        let url = self
            .url_template
            .replace("{symbol}", symbol)
            .replace("{start}", &start.format("%Y%m%d").to_string())
            .replace("{end}", &end.format("%Y%m%d").to_string());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                ClusterError::data_unavailable(format!("price fetch for `{}` failed: {}", symbol, e))
            })?;
        let body = response.text().await.map_err(|e| {
            ClusterError::data_unavailable(format!("price fetch for `{}` failed: {}", symbol, e))
        })?;

        let mut csv_reader = csv::Reader::from_reader(body.as_bytes());
        let mut series = BTreeMap::new();
        for row in csv_reader.deserialize() {
            let row: PriceRow = row.map_err(|e| {
                ClusterError::data_unavailable(format!(
                    "malformed price data for `{}`: {}",
                    symbol, e
                ))
            })?;
            series.insert(row.date, row.close);
        }

        if series.is_empty() {
            return Err(ClusterError::data_unavailable(format!(
                "no price rows returned for `{}`",
                symbol
            )));
        }

        Ok(series)
    }
}

#[async_trait]
impl PriceHistory for CsvPriceHistory {
    async fn fetch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeriesTable, ClusterError> {
        info!(
            "Fetching {} symbols from {} to {}",
            symbols.len(),
            start,
            end
        );

        let mut per_symbol: IndexMap<String, BTreeMap<NaiveDate, f64>> =
            IndexMap::with_capacity(symbols.len());
        for symbol in symbols {
            let series = self.fetch_one(symbol, start, end).await?;
            per_symbol.insert(symbol.clone(), series);
        }

        let index: Vec<NaiveDate> = per_symbol
            .values()
            .flat_map(|series| series.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns: IndexMap<String, Vec<f64>> = per_symbol
            .into_iter()
            .map(|(symbol, series)| {
                let values = index
                    .iter()
                    .map(|date| series.get(date).copied().unwrap_or(f64::NAN))
                    .collect();
                (symbol, values)
            })
            .collect();

        TimeSeriesTable::from_columns(index, columns)
    }
}

/// Disk cache in front of any [`PriceHistory`], keyed by the requested
/// symbol set and date range. A hit skips the network entirely; a corrupt
/// cache file is refetched and rewritten.
pub struct CachedPriceHistory<P> {
    inner: P,
    cache_dir: PathBuf,
}

impl<P> CachedPriceHistory<P> {
    pub fn new(inner: P, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
        }
    }

    fn cache_path(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> PathBuf {
        let mut hasher = Sha256::new();
        for symbol in symbols {
            hasher.update(symbol.as_bytes());
            hasher.update(b",");
        }
        let digest = hasher.finalize();
        let key: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();

        self.cache_dir
            .join(format!("prices_{}_{}_{}.json", start, end, key))
    }

    fn read_cached(path: &Path) -> Option<TimeSeriesTable> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(table) => Some(table),
            Err(e) => {
                warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[async_trait]
impl<P: PriceHistory> PriceHistory for CachedPriceHistory<P> {
    async fn fetch(
        &self,
        symbols: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeriesTable, ClusterError> {
        let path = self.cache_path(symbols, start, end);

        if path.exists() {
            if let Some(table) = Self::read_cached(&path) {
                info!("Loaded prices from cache {}", path.display());
                return Ok(table);
            }
        }

        let table = self.inner.fetch(symbols, start, end).await?;

        if let Err(e) = std::fs::create_dir_all(&self.cache_dir) {
            warn!("Cannot create cache dir {}: {}", self.cache_dir.display(), e);
            return Ok(table);
        }
        match serde_json::to_string(&table) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!("Cannot write cache file {}: {}", path.display(), e);
                }
            }
            Err(e) => warn!("Cannot serialize price table for cache: {}", e),
        }

        Ok(table)
    }
}
