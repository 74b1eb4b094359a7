// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory datasets exchanged with the orchestration layer.

use crate::error::{BridgeError, Result};
use arrow::compute::concat_batches;
use arrow_array::RecordBatch;
use arrow_schema::{Schema, SchemaRef};
use std::sync::Arc;

/// Ordered Arrow record batches sharing one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Dataset {
    /// Every batch must carry exactly `schema`.
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for (i, batch) in batches.iter().enumerate() {
            if batch.schema().fields() != schema.fields() {
                return Err(BridgeError::schema(format!(
                    "batch {i} does not match dataset schema"
                )));
            }
        }
        Ok(Self { schema, batches })
    }

    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            batches: vec![batch],
        }
    }

    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: Vec::new(),
        }
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name().as_str()).collect()
    }

    /// All rows as a single batch.
    pub fn concat(&self) -> Result<RecordBatch> {
        concat_batches(&self.schema, &self.batches)
            .map_err(|e| BridgeError::schema(format!("cannot combine batches: {e}")))
    }

    /// Keep only `columns`, in the order given.
    pub fn project<S: AsRef<str>>(&self, columns: &[S]) -> Result<Dataset> {
        let indices = columns
            .iter()
            .map(|c| {
                self.schema.index_of(c.as_ref()).map_err(|_| {
                    BridgeError::schema(format!("no column named '{}'", c.as_ref()))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let schema: Schema = self
            .schema
            .project(&indices)
            .map_err(|e| BridgeError::schema(e.to_string()))?;
        let batches = self
            .batches
            .iter()
            .map(|b| b.project(&indices))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BridgeError::schema(e.to_string()))?;

        Ok(Dataset {
            schema: Arc::new(schema),
            batches,
        })
    }
}

impl From<RecordBatch> for Dataset {
    fn from(batch: RecordBatch) -> Self {
        Dataset::from_batch(batch)
    }
}
