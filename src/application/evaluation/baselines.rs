//! Baseline labelings to compare clustering output against.

use crate::domain::errors::ClusterError;
use crate::domain::labels::LabelMap;
use crate::domain::ports::{ClassificationProvider, Scheme};
use crate::domain::table::TimeSeriesTable;

/// Every asset in one cluster.
pub fn one_cluster(table: &TimeSeriesTable) -> LabelMap {
    table
        .symbols()
        .into_iter()
        .map(|symbol| (symbol, "0".to_string()))
        .collect()
}

/// Every asset in its own cluster.
pub fn distinct_clusters(table: &TimeSeriesTable) -> LabelMap {
    table
        .symbols()
        .into_iter()
        .enumerate()
        .map(|(i, symbol)| (symbol, i.to_string()))
        .collect()
}

/// Labels pulled from the reference taxonomy for the table's assets.
///
/// Fails with `MissingLabel` when the provider does not know a symbol.
pub fn reference_clusters(
    table: &TimeSeriesTable,
    provider: &dyn ClassificationProvider,
    scheme: Scheme,
) -> Result<LabelMap, ClusterError> {
    let groups = provider.identifier_to_group(scheme);

    let mut labels = LabelMap::new();
    for symbol in table.symbols() {
        let label = groups.get(&symbol).ok_or(ClusterError::MissingLabel {
            symbol: symbol.clone(),
        })?;
        labels.insert(symbol, label);
    }

    Ok(labels)
}
