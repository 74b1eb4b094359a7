// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use arrow_csv::{ReaderBuilder, reader::Format};
use deltabridge::{Dataset, TableSlice};
use diagnostics::{log_debug, log_info};

use crate::common::{CliContext, ShipContext};

/// Rows examined when inferring column types.
const INFER_RECORDS: usize = 1000;

/// Load a CSV file with a header row, inferring column types.
pub fn read_csv(path: &Path) -> Result<Dataset> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read CSV file {}", path.display()))?;

    let mut cursor = Cursor::new(&content);
    let format = Format::default().with_header(true);
    let (schema, _) = format
        .infer_schema(&mut cursor, Some(INFER_RECORDS))
        .map_err(|e| anyhow!("Failed to infer CSV schema: {e}"))?;
    cursor.set_position(0);

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(cursor)
        .map_err(|e| anyhow!("Failed to create CSV reader: {e}"))?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow!("Failed to read CSV batch: {e}"))?;

    Ok(Dataset::try_new(schema, batches)?)
}

/// Write a CSV file as `namespace.table` and register it. Returns the report to print.
pub async fn write_command(
    ship: &ShipContext,
    namespace: &str,
    table: &str,
    csv_path: &Path,
) -> Result<String> {
    let csv_str = csv_path.display().to_string();
    log_debug!("Writing {csv} as {namespace}.{table}", csv: csv_str.as_str(), namespace: namespace, table: table);

    let dataset = read_csv(csv_path)?;
    let handler = ship.handler();
    let mut catalog = ship.open_catalog()?;
    let mut context = CliContext::default();

    let metadata = handler
        .handle_output(
            &mut context,
            &TableSlice::new(namespace, table),
            &dataset,
            &mut catalog,
        )
        .await?;

    let location_str = metadata.location.to_string();
    log_info!("Wrote {namespace}.{table} to {location}", namespace: namespace, table: table, location: location_str.as_str());

    let mut report = String::new();
    for (key, value) in &context.metadata {
        report.push_str(&format!("{key}: {value}\n"));
    }
    for error in &context.errors {
        report.push_str(&format!("warning: {error}\n"));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ship(base: &Path) -> ShipContext {
        ShipContext::new(None, "catalog.duckdb".into(), base.to_path_buf()).unwrap()
    }

    #[test]
    fn test_read_csv_infers_types() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("orders.csv");
        std::fs::write(&path, "id,name,amount\n1,Alice,1.5\n2,Bob,2.0\n").unwrap();

        let dataset = read_csv(&path).unwrap();
        assert_eq!(dataset.column_names(), vec!["id", "name", "amount"]);
        assert_eq!(dataset.num_rows(), 2);
        assert_eq!(
            dataset.schema().field(0).data_type(),
            &arrow::datatypes::DataType::Int64
        );
    }

    #[tokio::test]
    async fn test_write_command_reports_metadata() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("orders.csv");
        std::fs::write(&path, "id,name\n1,Alice\n2,Bob\n3,Carol\n").unwrap();

        let report = write_command(&ship(temp.path()), "sales", "orders", &path)
            .await
            .unwrap();

        assert!(report.contains("local_path: target/sales/orders\n"), "{report}");
        assert!(report.contains("row_count: 3\n"), "{report}");
        assert!(!report.contains("warning"), "{report}");
        assert!(temp.path().join("target/sales/orders/_delta_log").is_dir());
        assert!(temp.path().join("catalog.duckdb").exists());
    }

    #[tokio::test]
    async fn test_missing_csv() {
        let temp = tempdir().unwrap();
        let err = write_command(&ship(temp.path()), "sales", "orders", &temp.path().join("none.csv"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read CSV file"), "{err}");
        assert!(!temp.path().join("target").exists());
    }
}
