use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Constituent table with `Symbol`, `GICS Sector` and `GICS Sub-Industry`
/// columns, mirrored from the reference index listing.
pub const DEFAULT_CONSTITUENTS_URL: &str =
    "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/main/data/constituents.csv";

/// Daily OHLC CSV endpoint; `{symbol}`, `{start}` and `{end}` are
/// substituted per request.
pub const DEFAULT_PRICE_URL: &str =
    "https://stooq.com/q/d/l/?s={symbol}&d1={start}&d2={end}&i=d";

pub const DEFAULT_RISK_WINDOW: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub cache_dir: PathBuf,
    /// Local constituent table; takes precedence over the URL when set.
    pub constituents_path: Option<PathBuf>,
    pub constituents_url: String,
    pub price_url_template: String,
    /// Default window for rolling dispersion estimates.
    pub risk_window: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let cache_dir = env::var("EQUICLUSTER_CACHE_DIR")
            .unwrap_or_else(|_| "./data/cache".to_string())
            .into();

        let constituents_path = env::var("EQUICLUSTER_CONSTITUENTS_PATH")
            .ok()
            .map(PathBuf::from);

        let constituents_url = env::var("EQUICLUSTER_CONSTITUENTS_URL")
            .unwrap_or_else(|_| DEFAULT_CONSTITUENTS_URL.to_string());

        let price_url_template =
            env::var("EQUICLUSTER_PRICE_URL").unwrap_or_else(|_| DEFAULT_PRICE_URL.to_string());

        let risk_window: usize = env::var("EQUICLUSTER_RISK_WINDOW")
            .unwrap_or_else(|_| DEFAULT_RISK_WINDOW.to_string())
            .parse()
            .context("EQUICLUSTER_RISK_WINDOW must be a positive integer")?;
        if risk_window < 2 {
            anyhow::bail!(
                "EQUICLUSTER_RISK_WINDOW must be at least 2, got {}",
                risk_window
            );
        }

        Ok(Self {
            cache_dir,
            constituents_path,
            constituents_url,
            price_url_template,
            risk_window,
        })
    }
}
