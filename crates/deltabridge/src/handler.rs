// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The I/O-manager entry points.
//!
//! `handle_output` binds, writes and registers; `load_input` resolves and
//! reads. Write failures are returned. Registration failures are logged to
//! both diagnostics and the output context, and the write still succeeds, so
//! "written" and "queryable" must be checked separately.

use crate::catalog::{CatalogConnection, CatalogRegistrar, RegistrationRecord};
use crate::config::BridgeConfig;
use crate::dataset::Dataset;
use crate::error::{BridgeError, RegistrationError, Result};
use crate::fs::Filesystem;
use crate::identity::{PathResolver, TableLocation, TableSlice};
use crate::reader::TableReader;
use crate::schema::{TableSchema, bind};
use crate::writer::{OutputMetadata, TableWriter, WriteMetadata};
use diagnostics::{log_debug, log_error};
use std::sync::Arc;

/// Observability sink for an output.
pub trait OutputContext: Send {
    fn add_output_metadata(&mut self, metadata: OutputMetadata);

    fn log_error(&mut self, message: &str);

    fn log_info(&mut self, _message: &str) {}
}

/// What the caller knows about an input.
pub trait InputContext: Send + Sync {
    /// Schema the consumer expects; `None` accepts whatever is on disk.
    fn expected_schema(&self) -> Option<TableSchema> {
        None
    }
}

/// In-memory representations the handler accepts and produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// [`Dataset`]: Arrow record batches with a shared schema
    ArrowRecordBatches,
}

#[derive(Debug, Clone)]
pub struct TableHandler {
    resolver: PathResolver,
    writer: TableWriter,
    reader: TableReader,
    registrar: CatalogRegistrar,
    fs: Arc<dyn Filesystem>,
}

impl TableHandler {
    pub fn new(config: &BridgeConfig, fs: Arc<dyn Filesystem>) -> Self {
        Self {
            resolver: PathResolver::new(config.root.clone()),
            writer: TableWriter::new().with_target_file_size(config.target_file_size),
            reader: TableReader::new(),
            registrar: CatalogRegistrar::new(config.catalog.clone()),
            fs,
        }
    }

    pub fn supported_types(&self) -> &'static [DatasetKind] {
        &[DatasetKind::ArrowRecordBatches]
    }

    pub fn requires_filesystem(&self) -> bool {
        true
    }

    pub fn location(&self, table_slice: &TableSlice) -> Result<TableLocation> {
        Ok(self.resolver.resolve(&table_slice.identity()?))
    }

    /// Write `dataset` as the table named by `table_slice`, then register it.
    pub async fn handle_output<X, C>(
        &self,
        context: &mut X,
        table_slice: &TableSlice,
        dataset: &Dataset,
        connection: &mut C,
    ) -> Result<WriteMetadata>
    where
        X: OutputContext + ?Sized,
        C: CatalogConnection + ?Sized,
    {
        let identity = table_slice.identity()?;
        // Validate before touching storage or the catalog.
        let schema = bind(dataset)?;
        let location = self.resolver.resolve(&identity);

        let schema_str = schema.to_string();
        let table_str = identity.to_string();
        log_debug!("Bound schema {schema} for {table}", schema: schema_str.as_str(), table: table_str.as_str());

        let metadata = self
            .writer
            .write(self.fs.as_ref(), &location, &schema, dataset)
            .await?;
        context.add_output_metadata(metadata.to_output_metadata());

        let record = RegistrationRecord::new(&identity, &location);
        match self.registrar.register(connection, &record).await {
            Ok(()) => context.log_info(&format!("Registered table {record}")),
            Err(err) => report_registration_failure(context, &err),
        }

        Ok(metadata)
    }

    /// Read the table named by `table_slice`, projected to its columns if any.
    pub async fn load_input<X, C>(
        &self,
        context: &X,
        table_slice: &TableSlice,
        _connection: &mut C,
    ) -> Result<Dataset>
    where
        X: InputContext + ?Sized,
        C: CatalogConnection + ?Sized,
    {
        let location = self.location(table_slice)?;
        let expected = context.expected_schema();
        let dataset = self
            .reader
            .read(self.fs.as_ref(), &location, expected.as_ref())
            .await?;

        match &table_slice.columns {
            Some(columns) => dataset
                .project(columns)
                .map_err(|e| BridgeError::schema_mismatch(&location, e.to_string())),
            None => Ok(dataset),
        }
    }
}

fn report_registration_failure<X: OutputContext + ?Sized>(context: &mut X, err: &RegistrationError) {
    let record = err.record();
    let message = err.to_string();
    log_error!(
        "Error registering table {namespace}.{name} at {location}: {error}",
        namespace: record.namespace.as_str(),
        name: record.name.as_str(),
        location: record.location.as_str(),
        error: message.as_str()
    );
    context.log_error(&format!("Error registering table: {message}"));
}
