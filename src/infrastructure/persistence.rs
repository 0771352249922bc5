//! CSV persistence for price tables.
//!
//! Layout: a `Date` column followed by one column per symbol. Empty cells
//! round-trip as NaN.

use std::path::Path;

use chrono::NaiveDate;
use indexmap::IndexMap;
use tracing::info;

use crate::domain::errors::ClusterError;
use crate::domain::table::TimeSeriesTable;

pub fn read_price_csv(path: impl AsRef<Path>) -> Result<TimeSeriesTable, ClusterError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        ClusterError::data_unavailable(format!("cannot open {}: {}", path.display(), e))
    })?;

    let headers = reader
        .headers()
        .map_err(|e| {
            ClusterError::data_unavailable(format!("cannot read {}: {}", path.display(), e))
        })?
        .clone();
    let symbols: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    if symbols.is_empty() {
        return Err(ClusterError::data_unavailable(format!(
            "{} has no symbol columns",
            path.display()
        )));
    }

    let mut index = Vec::new();
    let mut values_by_column: Vec<Vec<f64>> = vec![Vec::new(); symbols.len()];

    for record in reader.records() {
        let record = record.map_err(|e| {
            ClusterError::data_unavailable(format!("cannot read {}: {}", path.display(), e))
        })?;

        let date_field = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(date_field, "%Y-%m-%d").map_err(|e| {
            ClusterError::validation(format!(
                "bad date `{}` in {}: {}",
                date_field,
                path.display(),
                e
            ))
        })?;
        index.push(date);

        for (col, field) in record.iter().skip(1).enumerate().take(symbols.len()) {
            let value = if field.is_empty() {
                f64::NAN
            } else {
                field.parse().map_err(|e| {
                    ClusterError::validation(format!(
                        "bad value `{}` for `{}` in {}: {}",
                        field,
                        symbols[col],
                        path.display(),
                        e
                    ))
                })?
            };
            values_by_column[col].push(value);
        }
    }

    let columns: IndexMap<String, Vec<f64>> =
        symbols.into_iter().zip(values_by_column).collect();

    info!(
        "Loaded {} rows x {} symbols from {}",
        index.len(),
        columns.len(),
        path.display()
    );

    TimeSeriesTable::from_columns(index, columns)
}

pub fn write_price_csv(
    path: impl AsRef<Path>,
    table: &TimeSeriesTable,
) -> Result<(), ClusterError> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        ClusterError::data_unavailable(format!("cannot write {}: {}", path.display(), e))
    })?;

    let mut header = vec!["Date".to_string()];
    header.extend(table.symbols());
    writer.write_record(&header).map_err(|e| {
        ClusterError::data_unavailable(format!("cannot write {}: {}", path.display(), e))
    })?;

    for (row, date) in table.index().iter().enumerate() {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        for value in table.row(row) {
            record.push(if value.is_nan() {
                String::new()
            } else {
                value.to_string()
            });
        }
        writer.write_record(&record).map_err(|e| {
            ClusterError::data_unavailable(format!("cannot write {}: {}", path.display(), e))
        })?;
    }

    writer.flush().map_err(|e| {
        ClusterError::data_unavailable(format!("cannot write {}: {}", path.display(), e))
    })?;

    Ok(())
}
