//! Clustering CLI
//!
//! Runs grid search or partitioned multi-cluster fits over a prices CSV,
//! and fetches price history into the local cache.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use equicluster::application::cluster_input::ClusterInput;
use equicluster::application::evaluation::{GridSearch, multi_cluster, negated_wcss};
use equicluster::application::models::{ParamGrid, ParamSet, resolve_factory};
use equicluster::application::transforms::{RateOfReturn, TransformSequence};
use equicluster::config::Config;
use equicluster::domain::labels::LabelMap;
use equicluster::domain::ports::{ClassificationProvider, PriceHistory, Scheme};
use equicluster::infrastructure::persistence::{read_price_csv, write_price_csv};
use equicluster::infrastructure::prices::{CachedPriceHistory, CsvPriceHistory};
use equicluster::infrastructure::reference::ConstituentDirectory;
use indexmap::IndexMap;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Equity return clustering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grid-search model hyperparameters against negated WCSS
    Grid {
        /// Prices CSV (Date column + one column per symbol)
        #[arg(short, long)]
        prices: String,

        /// Clustering model name
        #[arg(short, long, default_value = "kmeans")]
        model: String,

        /// TOML file with parameter grid configuration
        #[arg(long)]
        grid_config: Option<String>,

        /// Transform applied before clustering (canonical, returns, none)
        #[arg(long, default_value = "canonical")]
        transform: String,

        /// Classification scheme for the canonical pipeline
        #[arg(long, default_value = "sector")]
        scheme: String,

        /// L2-normalize each asset vector after orientation
        #[arg(long)]
        normalize: bool,

        /// Evaluate combinations on the rayon pool
        #[arg(long)]
        parallel: bool,

        /// Output JSON file for the winning configuration
        #[arg(short, long, default_value = "grid_search_results.json")]
        output: String,
    },
    /// Fit one model per reference group and merge the sub-labelings
    Multi {
        /// Prices CSV (Date column + one column per symbol)
        #[arg(short, long)]
        prices: String,

        /// Clustering model name
        #[arg(short, long, default_value = "kmeans")]
        model: String,

        /// Cluster count within each group
        #[arg(short, long, default_value = "3")]
        k: usize,

        /// Coarse grouping scheme (sector, sub-industry)
        #[arg(long, default_value = "sector")]
        scheme: String,

        /// Output JSON file for the merged labeling
        #[arg(short, long, default_value = "multi_cluster_labels.json")]
        output: String,
    },
    /// Fetch price history through the cache into a prices CSV
    Fetch {
        /// Comma-separated symbols; defaults to every reference constituent
        #[arg(short, long)]
        symbols: Option<String>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Output CSV file
        #[arg(short, long, default_value = "prices.csv")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Grid {
            prices,
            model,
            grid_config,
            transform,
            scheme,
            normalize,
            parallel,
            output,
        } => {
            let table = read_price_csv(&prices)?;
            let scheme = Scheme::from_str(&scheme)?;
            let sequence = build_sequence(&transform, scheme, &config).await?;

            let input = ClusterInput::build(&table, &sequence, normalize)?;
            let factory = resolve_factory(&model)?;

            let grid = if let Some(path) = grid_config {
                info!("Loading parameter grid from: {}", path);
                load_grid_from_toml(&path)?
            } else {
                info!("Using default parameter grid");
                default_grid()
            };

            let search = GridSearch::new(factory.as_ref(), grid);
            let outcome = if parallel {
                search.run_parallel(input.features(), &negated_wcss)?
            } else {
                search.run(input.features(), &negated_wcss)?
            };

            println!(
                "Best of {} combinations: [{}] (score {:.6})",
                outcome.evaluated, outcome.best_params, outcome.best_score
            );

            let json = serde_json::to_string_pretty(&outcome)?;
            std::fs::write(&output, json).context(format!("Failed to write {}", output))?;
            println!("Results written to {}", output);
        }
        Commands::Multi {
            prices,
            model,
            k,
            scheme,
            output,
        } => {
            let table = read_price_csv(&prices)?;
            let scheme = Scheme::from_str(&scheme)?;

            let directory = load_constituents(&config).await?;
            let coarse = directory.identifier_to_group(scheme);

            let params_by_group = per_group_params(&table.symbols(), &coarse, k);
            let factory = resolve_factory(&model)?;

            let sequence = TransformSequence::new(vec![Box::new(RateOfReturn)])?;
            let merged = multi_cluster(
                factory.as_ref(),
                &table,
                &coarse,
                &params_by_group,
                &sequence,
            )?;

            for (symbol, label) in merged.iter() {
                println!("{:<8} {}", symbol, label);
            }

            let json = serde_json::to_string_pretty(&merged)?;
            std::fs::write(&output, json).context(format!("Failed to write {}", output))?;
            println!("Labeling written to {}", output);
        }
        Commands::Fetch {
            symbols,
            start,
            end,
            output,
        } => {
            let (start, end) = parse_date_range(&start, &end)?;

            let symbols: Vec<String> = match symbols {
                Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
                None => load_constituents(&config).await?.identifiers(),
            };

            let source = CachedPriceHistory::new(
                CsvPriceHistory::new(config.price_url_template.clone()),
                config.cache_dir.clone(),
            );
            let table = source.fetch(&symbols, start, end).await?;

            write_price_csv(&output, &table)?;
            println!(
                "Wrote {} rows x {} symbols to {}",
                table.n_rows(),
                table.n_cols(),
                output
            );
        }
    }

    Ok(())
}

/// Parses start and end date strings, requiring a non-empty range.
fn parse_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .context(format!("Invalid start date format: {}", start))?;
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
        .context(format!("Invalid end date format: {}", end))?;
    if start >= end {
        anyhow::bail!("start date {} is not before end date {}", start, end);
    }
    Ok((start, end))
}

/// Loads a parameter grid from a TOML file.
fn load_grid_from_toml(path: &str) -> Result<ParamGrid> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read grid config file: {}", path))?;
    let grid: ParamGrid =
        toml::from_str(&content).context(format!("Failed to parse grid config TOML: {}", path))?;
    Ok(grid)
}

fn default_grid() -> ParamGrid {
    let mut grid = ParamGrid::new();
    grid.insert("k", (2i64..=8).map(Into::into).collect());
    grid
}

async fn load_constituents(config: &Config) -> Result<ConstituentDirectory> {
    let directory = match &config.constituents_path {
        Some(path) => ConstituentDirectory::from_csv_path(path)?,
        None => ConstituentDirectory::fetch(&config.constituents_url).await?,
    };
    Ok(directory)
}

async fn build_sequence(
    transform: &str,
    scheme: Scheme,
    config: &Config,
) -> Result<TransformSequence> {
    let sequence = match transform.to_lowercase().as_str() {
        "canonical" => {
            let directory = load_constituents(config).await?;
            TransformSequence::canonical(directory.identifier_to_group(scheme))?
        }
        "returns" => TransformSequence::new(vec![Box::new(RateOfReturn)])?,
        "none" => TransformSequence::identity(),
        other => anyhow::bail!(
            "unknown transform `{}`; expected canonical, returns or none",
            other
        ),
    };
    Ok(sequence)
}

/// One parameter set per coarse group present in the table.
fn per_group_params(symbols: &[String], coarse: &LabelMap, k: usize) -> IndexMap<String, ParamSet> {
    let mut params_by_group = IndexMap::new();
    for symbol in symbols {
        let Some(group) = coarse.get(symbol) else {
            continue; // multi_cluster reports the missing label itself
        };
        params_by_group.entry(group.to_string()).or_insert_with(|| {
            let mut params = ParamSet::new();
            params.insert("k", k as i64);
            params
        });
    }
    params_by_group
}
