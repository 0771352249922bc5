//! Baseline benchmark CLI
//!
//! Scores the trivial partitions (one cluster, all distinct) and the
//! reference classification against a prices CSV, for eyeballing how much
//! structure a fitted clustering would have to beat.

use anyhow::{Context, Result};
use clap::Parser;
use equicluster::application::cluster_input::ClusterInput;
use equicluster::application::evaluation::baselines::{
    distinct_clusters, one_cluster, reference_clusters,
};
use equicluster::application::evaluation::wcss;
use equicluster::application::transforms::{RateOfReturn, TransformSequence};
use equicluster::config::Config;
use equicluster::domain::labels::LabelMap;
use equicluster::domain::ports::Scheme;
use equicluster::infrastructure::persistence::read_price_csv;
use equicluster::infrastructure::reference::ConstituentDirectory;

#[derive(Parser)]
#[command(author, version, about = "Baseline partition benchmark", long_about = None)]
struct Cli {
    /// Prices CSV (Date column + one column per symbol)
    #[arg(short, long)]
    prices: String,

    /// Score raw prices instead of returns
    #[arg(long)]
    raw: bool,

    /// Skip the reference-classification baselines (offline mode)
    #[arg(long)]
    no_reference: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let prices = read_price_csv(&cli.prices)?;
    let table = if cli.raw {
        ClusterInput::transform_only(&prices, &TransformSequence::identity())?
    } else {
        let returns = TransformSequence::new(vec![Box::new(RateOfReturn)])?;
        ClusterInput::transform_only(&prices, &returns)?
    };

    println!("{}", "=".repeat(60));
    println!(
        "Baselines over {} rows x {} symbols ({})",
        table.n_rows(),
        table.n_cols(),
        if cli.raw { "raw prices" } else { "returns" }
    );
    println!("{}", "=".repeat(60));

    print_score("one cluster", &table, &one_cluster(&table))?;
    print_score("all distinct", &table, &distinct_clusters(&table))?;

    if !cli.no_reference {
        let directory = match &config.constituents_path {
            Some(path) => ConstituentDirectory::from_csv_path(path)?,
            None => ConstituentDirectory::fetch(&config.constituents_url).await?,
        };

        let sector = reference_clusters(&table, &directory, Scheme::Sector)
            .context("sector baseline needs a label for every symbol")?;
        print_score("sector", &table, &sector)?;

        let subind = reference_clusters(&table, &directory, Scheme::SubIndustry)
            .context("sub-industry baseline needs a label for every symbol")?;
        print_score("sub-industry", &table, &subind)?;
    }

    Ok(())
}

fn print_score(
    name: &str,
    table: &equicluster::domain::table::TimeSeriesTable,
    labels: &LabelMap,
) -> Result<()> {
    let score = wcss(table, labels)?;
    println!(
        "{:<14} {:>4} groups  WCSS {:>14.6}",
        name,
        labels.distinct_labels().len(),
        score
    );
    Ok(())
}
