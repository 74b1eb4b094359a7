// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Materialize a dataset as a Delta table.
//!
//! Data files are written first and the commit entry in `_delta_log` last, so
//! a write that dies part way never becomes a version the reader will open.
//! Every write replaces the whole table, schema included.
//!
//! Writes run on a single partition so one writer emits `part-00001`,
//! `part-00002`, ... in row order, whatever the host's core count.

use crate::dataset::Dataset;
use crate::error::{BridgeError, Result};
use crate::fs::Filesystem;
use crate::identity::TableLocation;
use crate::reader;
use crate::schema::{LogicalType, TableSchema};
use arrow_array::RecordBatch;
use deltalake::DeltaOps;
use deltalake::datafusion::execution::session_state::{SessionState, SessionStateBuilder};
use deltalake::datafusion::prelude::SessionConfig;
use deltalake::kernel::{DataType as DeltaDataType, PrimitiveType, StructField};
use deltalake::operations::write::SchemaMode;
use deltalake::protocol::SaveMode;
use diagnostics::{log_debug, log_info};
use std::collections::BTreeMap;
use std::fmt;

/// What a write produced, for the caller's observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteMetadata {
    pub location: TableLocation,
    pub row_count: usize,
    /// Delta version created by this write
    pub table_version: Option<i64>,
    /// Data files making up the table after this write
    pub num_files: usize,
}

/// Value attached to an output's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Text(String),
    Int(i64),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Text(s) => f.write_str(s),
            MetadataValue::Int(i) => write!(f, "{i}"),
        }
    }
}

pub type OutputMetadata = BTreeMap<String, MetadataValue>;

impl WriteMetadata {
    pub fn to_output_metadata(&self) -> OutputMetadata {
        let mut metadata = OutputMetadata::new();
        metadata.insert(
            "local_path".to_string(),
            MetadataValue::Text(self.location.to_string()),
        );
        metadata.insert(
            "row_count".to_string(),
            MetadataValue::Int(i64::try_from(self.row_count).unwrap_or(i64::MAX)),
        );
        metadata.insert(
            "num_files".to_string(),
            MetadataValue::Int(i64::try_from(self.num_files).unwrap_or(i64::MAX)),
        );
        if let Some(version) = self.table_version {
            metadata.insert("table_version".to_string(), MetadataValue::Int(version));
        }
        metadata
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableWriter {
    target_file_size: Option<usize>,
}

impl TableWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split data into files of roughly this many bytes.
    pub fn with_target_file_size(mut self, bytes: Option<usize>) -> Self {
        self.target_file_size = bytes;
        self
    }

    pub async fn write(
        &self,
        fs: &dyn Filesystem,
        location: &TableLocation,
        schema: &TableSchema,
        dataset: &Dataset,
    ) -> Result<WriteMetadata> {
        let batches = conform_dataset(schema, dataset)?;
        let row_count = dataset.num_rows();

        fs.make_directories(location.as_path(), true)
            .await
            .map_err(|e| BridgeError::write(location, e))?;
        let uri = fs
            .table_uri(location.as_path())
            .await
            .map_err(|e| BridgeError::write(location, e))?;

        log_debug!(
            "Writing {rows} rows in {batches} batches to {uri}",
            rows: row_count,
            batches: batches.len(),
            uri: uri.as_str()
        );

        replace_schema_if_changed(fs, location, schema).await?;

        let mut builder = DeltaOps::try_from_uri(&uri)
            .await
            .map_err(|e| BridgeError::write(location, e))?
            .write(batches)
            .with_save_mode(SaveMode::Overwrite)
            .with_schema_mode(SchemaMode::Overwrite)
            .with_input_session_state(write_session());
        if let Some(bytes) = self.target_file_size {
            builder = builder.with_target_file_size(bytes);
        }
        let table = builder.await.map_err(|e| BridgeError::write(location, e))?;

        let num_files = table
            .get_file_uris()
            .map_err(|e| BridgeError::write(location, e))?
            .count();
        let table_version = Some(table.version());

        let location_str = location.to_string();
        log_info!(
            "Wrote {rows} rows to {location} as version {version}",
            rows: row_count,
            location: location_str.as_str(),
            version: table_version.unwrap_or_default()
        );

        Ok(WriteMetadata {
            location: location.clone(),
            row_count,
            table_version,
            num_files,
        })
    }
}

/// Session for the write plan. One target partition keeps a single writer,
/// so data file numbering follows row order.
fn write_session() -> SessionState {
    SessionStateBuilder::new()
        .with_default_features()
        .with_config(SessionConfig::new().with_target_partitions(1))
        .build()
}

/// An overwrite still checks rows against the existing table's constraints,
/// so a table whose schema changes gets new metadata first.
async fn replace_schema_if_changed(
    fs: &dyn Filesystem,
    location: &TableLocation,
    schema: &TableSchema,
) -> Result<()> {
    let table = match reader::open(fs, location).await {
        Ok(table) => table,
        Err(BridgeError::TableNotFound { .. }) => return Ok(()),
        Err(e) => return Err(e),
    };
    let on_disk = reader::on_disk_schema(&table, location)?;
    if &on_disk == schema {
        return Ok(());
    }

    let location_str = location.to_string();
    let old_str = on_disk.to_string();
    let new_str = schema.to_string();
    log_info!(
        "Replacing schema of {location}: {old} becomes {new}",
        location: location_str.as_str(),
        old: old_str.as_str(),
        new: new_str.as_str()
    );

    let columns = schema
        .columns()
        .iter()
        .map(|c| {
            Ok(StructField::new(
                c.name.clone(),
                delta_type(&c.logical_type)?,
                c.nullable,
            ))
        })
        .collect::<Result<Vec<_>>>()?;
    DeltaOps(table)
        .create()
        .with_columns(columns)
        .with_save_mode(SaveMode::Overwrite)
        .await
        .map_err(|e| BridgeError::write(location, e))?;
    Ok(())
}

fn delta_type(logical_type: &LogicalType) -> Result<DeltaDataType> {
    let primitive = match logical_type {
        LogicalType::Boolean => PrimitiveType::Boolean,
        LogicalType::Byte => PrimitiveType::Byte,
        LogicalType::Short => PrimitiveType::Short,
        LogicalType::Integer => PrimitiveType::Integer,
        LogicalType::Long => PrimitiveType::Long,
        LogicalType::Float => PrimitiveType::Float,
        LogicalType::Double => PrimitiveType::Double,
        LogicalType::Decimal { precision, scale } => {
            return DeltaDataType::decimal(*precision, *scale as u8)
                .map_err(|e| BridgeError::schema(format!("{logical_type}: {e}")));
        }
        LogicalType::String => PrimitiveType::String,
        LogicalType::Binary => PrimitiveType::Binary,
        LogicalType::Date => PrimitiveType::Date,
        LogicalType::Timestamp => PrimitiveType::Timestamp,
        LogicalType::TimestampNtz => PrimitiveType::TimestampNtz,
    };
    Ok(DeltaDataType::Primitive(primitive))
}

/// Check the dataset against the bound schema and convert it to canonical types.
fn conform_dataset(schema: &TableSchema, dataset: &Dataset) -> Result<Vec<RecordBatch>> {
    let bound = TableSchema::try_from_arrow(&dataset.schema())?;
    if bound.column_names() != schema.column_names() {
        return Err(BridgeError::schema(format!(
            "dataset columns {:?} do not match table schema {schema}",
            dataset.column_names()
        )));
    }
    for (have, want) in bound.columns().iter().zip(schema.columns()) {
        if have.logical_type != want.logical_type {
            return Err(BridgeError::schema(format!(
                "column '{}' is {} in the dataset but {} in the table schema",
                have.name, have.logical_type, want.logical_type
            )));
        }
        if have.nullable && !want.nullable {
            return Err(BridgeError::schema(format!(
                "column '{}' is nullable in the dataset but not in the table schema",
                have.name
            )));
        }
    }

    if dataset.batches().is_empty() {
        // An empty batch still records the schema in the table.
        return Ok(vec![RecordBatch::new_empty(schema.to_arrow())]);
    }
    dataset.batches().iter().map(|b| schema.conform(b)).collect()
}
