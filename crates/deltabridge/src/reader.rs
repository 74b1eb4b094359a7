// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Load a Delta table back into a dataset.

use crate::dataset::Dataset;
use crate::error::{BridgeError, Result};
use crate::fs::Filesystem;
use crate::identity::TableLocation;
use crate::schema::{TableSchema, verify};
use bytes::Bytes;
use deltalake::DeltaTableError;
use deltalake::delta_datafusion::DataFusionMixins;
use diagnostics::{log_debug, log_info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

#[derive(Debug, Clone, Copy, Default)]
pub struct TableReader;

impl TableReader {
    pub fn new() -> Self {
        Self
    }

    /// Schema of the current table version, without reading data.
    pub async fn schema(&self, fs: &dyn Filesystem, location: &TableLocation) -> Result<TableSchema> {
        let table = open(fs, location).await?;
        on_disk_schema(&table, location)
    }

    /// Read every row of the current version.
    ///
    /// With `expected`, the on-disk schema must be compatible and the rows are
    /// returned in the expected column order and types.
    pub async fn read(
        &self,
        fs: &dyn Filesystem,
        location: &TableLocation,
        expected: Option<&TableSchema>,
    ) -> Result<Dataset> {
        let table = open(fs, location).await?;
        let on_disk = on_disk_schema(&table, location)?;
        let schema = verify(location, &on_disk, expected)?;

        // Writers name files part-00000, part-00001, ... in row order.
        let mut files: Vec<String> = table
            .get_file_uris()
            .map_err(|e| BridgeError::corrupt(location, e))?
            .collect();
        files.sort_by(|a, b| (part_index(a), file_name(a)).cmp(&(part_index(b), file_name(b))));

        let mut batches = Vec::new();
        for uri in &files {
            log_debug!("Reading data file {uri}", uri: uri.as_str());
            let path = fs
                .path_from_uri(uri)
                .map_err(|e| BridgeError::corrupt(location, e))?;
            let content = fs
                .read_file(&path)
                .await
                .map_err(|e| BridgeError::corrupt(location, e))?;
            let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(content))
                .map_err(|e| BridgeError::corrupt(location, e))?
                .build()
                .map_err(|e| BridgeError::corrupt(location, e))?;
            for batch in reader {
                let batch = batch.map_err(|e| BridgeError::corrupt(location, e))?;
                batches.push(schema.conform(&batch)?);
            }
        }

        let dataset = Dataset::try_new(schema.to_arrow(), batches)?;
        let location_str = location.to_string();
        log_info!(
            "Read {rows} rows from {files} files at {location}",
            rows: dataset.num_rows(),
            files: files.len(),
            location: location_str.as_str()
        );
        Ok(dataset)
    }
}

/// Open the current version, or `TableNotFound` when nothing was ever committed.
pub(crate) async fn open(fs: &dyn Filesystem, location: &TableLocation) -> Result<deltalake::DeltaTable> {
    let has_log = fs
        .exists(&location.log_dir())
        .await
        .map_err(|e| BridgeError::corrupt(location, e))?;
    if !has_log {
        return Err(BridgeError::table_not_found(location));
    }

    let uri = fs
        .table_uri(location.as_path())
        .await
        .map_err(|e| BridgeError::corrupt(location, e))?;
    match deltalake::open_table(&uri).await {
        Ok(table) => Ok(table),
        // A log directory without any committed version
        Err(DeltaTableError::NotATable(_)) => Err(BridgeError::table_not_found(location)),
        Err(e) => Err(BridgeError::corrupt(location, e)),
    }
}

pub(crate) fn on_disk_schema(table: &deltalake::DeltaTable, location: &TableLocation) -> Result<TableSchema> {
    let arrow_schema = table
        .snapshot()
        .and_then(|snapshot| snapshot.arrow_schema())
        .map_err(|e| BridgeError::corrupt(location, e))?;
    TableSchema::try_from_arrow(&arrow_schema)
}

fn file_name(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// The `N` of a `part-N-...` data file.
fn part_index(uri: &str) -> Option<u64> {
    let rest = file_name(uri).strip_prefix("part-")?;
    let digits = rest.split('-').next()?;
    digits.parse().ok()
}
