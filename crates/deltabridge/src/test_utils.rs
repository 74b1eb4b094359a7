// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for unit tests.

use crate::catalog::{BoundParam, CatalogConnection};
use crate::dataset::Dataset;
use crate::error::ConnectionError;
use crate::handler::{InputContext, OutputContext};
use crate::schema::TableSchema;
use crate::writer::OutputMetadata;
use arrow_array::{
    BinaryArray, BooleanArray, Date32Array, Decimal128Array, Float32Array, Float64Array,
    Int8Array, Int16Array, Int32Array, Int64Array, RecordBatch, StringArray,
    TimestampMicrosecondArray,
};
use arrow_schema::{DataType, Field, Schema, TimeUnit};
use async_trait::async_trait;
use std::sync::Arc;

/// Which call a [`RecordingConnection`] should fail.
#[derive(Debug, Clone, Copy)]
pub enum FailOn {
    /// Any statement whose SQL contains this text
    Statement(&'static str),
    Commit,
}

/// A catalog connection that records what it is asked to do.
#[derive(Debug, Default)]
pub struct RecordingConnection {
    pub statements: Vec<(String, Vec<BoundParam>)>,
    pub commits: usize,
    pub rollbacks: usize,
    fail_on: Option<FailOn>,
    /// Fail everything after an error until rollback
    abort_on_error: bool,
    aborted: bool,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(fail_on: FailOn) -> Self {
        Self {
            fail_on: Some(fail_on),
            ..Self::default()
        }
    }

    /// Behave like an engine whose failed statement aborts the transaction.
    pub fn aborting(mut self) -> Self {
        self.abort_on_error = true;
        self
    }

    /// Parameters of every `register_table` call, in order.
    pub fn registrations(&self) -> Vec<&Vec<BoundParam>> {
        self.statements
            .iter()
            .filter(|(sql, _)| sql.contains("system.register_table"))
            .map(|(_, params)| params)
            .collect()
    }
}

#[async_trait]
impl CatalogConnection for RecordingConnection {
    async fn execute(&mut self, sql: &str, params: &[BoundParam]) -> Result<u64, ConnectionError> {
        if self.aborted {
            return Err(ConnectionError::new("current transaction is aborted"));
        }
        self.statements.push((sql.to_string(), params.to_vec()));
        match self.fail_on {
            Some(FailOn::Statement(text)) if sql.contains(text) => {
                self.aborted = self.abort_on_error;
                Err(ConnectionError::new(format!("statement failed: {sql}")))
            }
            _ => Ok(0),
        }
    }

    async fn commit(&mut self) -> Result<(), ConnectionError> {
        if self.aborted {
            return Err(ConnectionError::new("current transaction is aborted"));
        }
        if let Some(FailOn::Commit) = self.fail_on {
            return Err(ConnectionError::new("commit failed"));
        }
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), ConnectionError> {
        self.aborted = false;
        self.rollbacks += 1;
        Ok(())
    }
}

/// Records metadata and errors for an output, and supplies an expected schema for an input.
#[derive(Debug, Default)]
pub struct RecordingContext {
    pub metadata: OutputMetadata,
    pub errors: Vec<String>,
    pub infos: Vec<String>,
    pub expected: Option<TableSchema>,
}

impl OutputContext for RecordingContext {
    fn add_output_metadata(&mut self, metadata: OutputMetadata) {
        self.metadata.extend(metadata);
    }

    fn log_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn log_info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }
}

impl InputContext for RecordingContext {
    fn expected_schema(&self) -> Option<TableSchema> {
        self.expected.clone()
    }
}

/// `id` (int32) and `name` (utf8), three rows, no nulls.
pub fn orders_dataset() -> Dataset {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("name", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int32Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec!["Alice", "Bob", "Carol"])),
        ],
    )
    .unwrap();
    Dataset::from_batch(batch)
}

/// One column of every canonical type, with nulls in the nullable ones.
pub fn wide_dataset() -> Dataset {
    let schema = Arc::new(Schema::new(vec![
        Field::new("flag", DataType::Boolean, true),
        Field::new("tiny", DataType::Int8, false),
        Field::new("small", DataType::Int16, false),
        Field::new("int", DataType::Int32, true),
        Field::new("long", DataType::Int64, false),
        Field::new("float", DataType::Float32, false),
        Field::new("double", DataType::Float64, true),
        Field::new("amount", DataType::Decimal128(10, 2), true),
        Field::new("text", DataType::Utf8, true),
        Field::new("blob", DataType::Binary, true),
        Field::new("day", DataType::Date32, false),
        Field::new(
            "at",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            true,
        ),
        Field::new("local_at", DataType::Timestamp(TimeUnit::Microsecond, None), false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(BooleanArray::from(vec![Some(true), None, Some(false)])),
            Arc::new(Int8Array::from(vec![-1, 0, 127])),
            Arc::new(Int16Array::from(vec![-300, 0, 300])),
            Arc::new(Int32Array::from(vec![Some(1), None, Some(3)])),
            Arc::new(Int64Array::from(vec![i64::MIN, 0, i64::MAX])),
            Arc::new(Float32Array::from(vec![1.5, -2.25, 0.0])),
            Arc::new(Float64Array::from(vec![Some(3.5), Some(-1.0), None])),
            Arc::new(
                Decimal128Array::from(vec![Some(12_345), None, Some(-1)])
                    .with_precision_and_scale(10, 2)
                    .unwrap(),
            ),
            Arc::new(StringArray::from(vec![Some("a"), None, Some("ünïcode")])),
            Arc::new(BinaryArray::from(vec![
                Some(b"\x00\x01".as_ref()),
                None,
                Some(b"".as_ref()),
            ])),
            Arc::new(Date32Array::from(vec![0, 19_000, -1])),
            Arc::new(
                TimestampMicrosecondArray::from(vec![Some(1_700_000_000_000_000), None, Some(0)])
                    .with_timezone("UTC"),
            ),
            Arc::new(TimestampMicrosecondArray::from(vec![0, 1, 1_700_000_000_000_000])),
        ],
    )
    .unwrap();
    Dataset::from_batch(batch)
}

/// `n` rows of ascending `seq` (int64) with a padded `label`, split into batches.
pub fn sequence_dataset(n: usize) -> Dataset {
    let schema = Arc::new(Schema::new(vec![
        Field::new("seq", DataType::Int64, false),
        Field::new("label", DataType::Utf8, false),
    ]));
    let batches = (0..n)
        .collect::<Vec<_>>()
        .chunks(8192)
        .map(|chunk| {
            let seq: Vec<i64> = chunk.iter().map(|&i| i as i64).collect();
            let label: Vec<String> = chunk.iter().map(|i| format!("row-{i:08}")).collect();
            RecordBatch::try_new(
                schema.clone(),
                vec![
                    Arc::new(Int64Array::from(seq)),
                    Arc::new(StringArray::from(label)),
                ],
            )
            .unwrap()
        })
        .collect();
    Dataset::try_new(schema, batches).unwrap()
}
