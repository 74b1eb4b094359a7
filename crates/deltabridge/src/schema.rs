// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Table schemas and the mapping between Arrow types and Delta logical types
//!
//! Every Arrow column type is checked against an explicit mapping table at
//! bind time. A column either maps to one [`LogicalType`] or the bind fails;
//! nothing is converted implicitly. Each logical type has one canonical Arrow
//! type, which is what the writer stores and the reader returns.

use crate::dataset::Dataset;
use crate::error::{BridgeError, Result};
use arrow::compute::cast;
use arrow_array::RecordBatch;
use arrow_schema::{DataType, Field, Schema, SchemaRef, TimeUnit};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Largest precision Delta Lake accepts for decimals.
pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// Column types of the table format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    Decimal { precision: u8, scale: i8 },
    String,
    Binary,
    Date,
    /// Microsecond instant, stored adjusted to UTC.
    Timestamp,
    /// Microsecond wall-clock time without a zone.
    TimestampNtz,
}

impl LogicalType {
    /// The mapping table. `None` means the Arrow type has no table-format counterpart.
    pub fn from_arrow(data_type: &DataType) -> Option<LogicalType> {
        Some(match data_type {
            DataType::Boolean => LogicalType::Boolean,
            DataType::Int8 => LogicalType::Byte,
            DataType::Int16 => LogicalType::Short,
            DataType::Int32 => LogicalType::Integer,
            DataType::Int64 => LogicalType::Long,
            DataType::Float32 => LogicalType::Float,
            DataType::Float64 => LogicalType::Double,
            DataType::Decimal128(precision, scale)
                if (1..=MAX_DECIMAL_PRECISION).contains(precision)
                    && *scale >= 0
                    && (*scale as u8) <= *precision =>
            {
                LogicalType::Decimal {
                    precision: *precision,
                    scale: *scale,
                }
            }
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => LogicalType::String,
            DataType::Binary | DataType::LargeBinary | DataType::BinaryView => LogicalType::Binary,
            DataType::Date32 | DataType::Date64 => LogicalType::Date,
            DataType::Timestamp(_, Some(_)) => LogicalType::Timestamp,
            DataType::Timestamp(_, None) => LogicalType::TimestampNtz,
            _ => return None,
        })
    }

    /// Arrow type used on disk and returned by reads.
    pub fn to_arrow(&self) -> DataType {
        match self {
            LogicalType::Boolean => DataType::Boolean,
            LogicalType::Byte => DataType::Int8,
            LogicalType::Short => DataType::Int16,
            LogicalType::Integer => DataType::Int32,
            LogicalType::Long => DataType::Int64,
            LogicalType::Float => DataType::Float32,
            LogicalType::Double => DataType::Float64,
            LogicalType::Decimal { precision, scale } => DataType::Decimal128(*precision, *scale),
            LogicalType::String => DataType::Utf8,
            LogicalType::Binary => DataType::Binary,
            LogicalType::Date => DataType::Date32,
            LogicalType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            LogicalType::TimestampNtz => DataType::Timestamp(TimeUnit::Microsecond, None),
        }
    }

    /// Whether values stored as `self` can be read as `wanted` without loss.
    pub fn reads_as(&self, wanted: &LogicalType) -> bool {
        use LogicalType::*;
        if self == wanted {
            return true;
        }
        matches!(
            (self, wanted),
            (Byte, Short | Integer | Long)
                | (Short, Integer | Long)
                | (Integer, Long)
                | (Float, Double)
        )
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Boolean => write!(f, "boolean"),
            LogicalType::Byte => write!(f, "byte"),
            LogicalType::Short => write!(f, "short"),
            LogicalType::Integer => write!(f, "integer"),
            LogicalType::Long => write!(f, "long"),
            LogicalType::Float => write!(f, "float"),
            LogicalType::Double => write!(f, "double"),
            LogicalType::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            LogicalType::String => write!(f, "string"),
            LogicalType::Binary => write!(f, "binary"),
            LogicalType::Date => write!(f, "date"),
            LogicalType::Timestamp => write!(f, "timestamp"),
            LogicalType::TimestampNtz => write!(f, "timestamp_ntz"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub logical_type: LogicalType,
    pub nullable: bool,
}

impl ColumnSchema {
    pub fn new<S: Into<String>>(name: S, logical_type: LogicalType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            logical_type,
            nullable,
        }
    }

    pub fn to_arrow(&self) -> Field {
        Field::new(&self.name, self.logical_type.to_arrow(), self.nullable)
    }
}

/// Ordered columns of a table. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn try_new(columns: Vec<ColumnSchema>) -> Result<Self> {
        if columns.is_empty() {
            return Err(BridgeError::schema("table schema has no columns"));
        }
        let mut seen = HashSet::new();
        for column in &columns {
            if column.name.is_empty() {
                return Err(BridgeError::schema("column name is empty"));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(BridgeError::schema(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Map every field of an Arrow schema through the mapping table.
    pub fn try_from_arrow(schema: &Schema) -> Result<Self> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                LogicalType::from_arrow(field.data_type())
                    .map(|t| ColumnSchema::new(field.name(), t, field.is_nullable()))
                    .ok_or_else(|| {
                        BridgeError::schema(format!(
                            "column '{}' has type {} which has no table-format mapping",
                            field.name(),
                            field.data_type()
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::try_new(columns)
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn to_arrow(&self) -> SchemaRef {
        Arc::new(Schema::new(
            self.columns.iter().map(ColumnSchema::to_arrow).collect::<Vec<_>>(),
        ))
    }

    /// Restrict to `names`, in the order given.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<TableSchema> {
        let columns = names
            .iter()
            .map(|n| {
                self.column(n.as_ref())
                    .cloned()
                    .ok_or_else(|| BridgeError::schema(format!("no column named '{}'", n.as_ref())))
            })
            .collect::<Result<Vec<_>>>()?;
        TableSchema::try_new(columns)
    }

    /// Rebuild `batch` with this schema's columns and canonical types.
    ///
    /// Columns are looked up by name, so the batch may order them differently.
    pub fn conform(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let source = batch.schema();
        let arrays = self
            .columns
            .iter()
            .map(|column| {
                let index = source.index_of(&column.name).map_err(|_| {
                    BridgeError::schema(format!("batch has no column '{}'", column.name))
                })?;
                let target = column.logical_type.to_arrow();
                let array = batch.column(index);
                if array.data_type() == &target {
                    Ok(Arc::clone(array))
                } else {
                    cast(array, &target).map_err(|e| {
                        BridgeError::schema(format!(
                            "column '{}' can not be stored as {}: {e}",
                            column.name, column.logical_type
                        ))
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        RecordBatch::try_new(self.to_arrow(), arrays)
            .map_err(|e| BridgeError::schema(e.to_string()))
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({}:{})", column.name, column.logical_type)?;
        }
        write!(f, "]")
    }
}

/// Derive the table schema for a dataset about to be written.
///
/// Pure validation: fails before anything touches storage or the catalog.
pub fn bind(dataset: &Dataset) -> Result<TableSchema> {
    if dataset.num_columns() == 0 {
        return Err(BridgeError::schema("dataset has no columns"));
    }
    TableSchema::try_from_arrow(&dataset.schema())
}

/// Reconcile the schema found on disk with the one a reader expects.
///
/// With no expectation the on-disk schema is returned. Otherwise the column
/// sets must agree, each on-disk type must read as the expected type, and an
/// expected non-nullable column must not be nullable on disk. The expected
/// schema, with its column order, is returned.
pub fn verify(
    location: &dyn fmt::Display,
    on_disk: &TableSchema,
    expected: Option<&TableSchema>,
) -> Result<TableSchema> {
    let Some(expected) = expected else {
        return Ok(on_disk.clone());
    };

    if expected.columns.len() != on_disk.columns.len() {
        return Err(BridgeError::schema_mismatch(
            location,
            format!("expected {expected}, found {on_disk}"),
        ));
    }

    for want in &expected.columns {
        let Some(have) = on_disk.column(&want.name) else {
            return Err(BridgeError::schema_mismatch(
                location,
                format!("column '{}' is not in the table {on_disk}", want.name),
            ));
        };
        if !have.logical_type.reads_as(&want.logical_type) {
            return Err(BridgeError::schema_mismatch(
                location,
                format!(
                    "column '{}' is {} on disk, expected {}",
                    want.name, have.logical_type, want.logical_type
                ),
            ));
        }
        if have.nullable && !want.nullable {
            return Err(BridgeError::schema_mismatch(
                location,
                format!("column '{}' is nullable on disk, expected non-nullable", want.name),
            ));
        }
    }

    Ok(expected.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::orders_dataset;
    use arrow_array::{
        Array, Int32Array, LargeStringArray, TimestampNanosecondArray, TimestampMicrosecondArray,
    };

    fn orders_schema() -> TableSchema {
        TableSchema::try_new(vec![
            ColumnSchema::new("id", LogicalType::Integer, false),
            ColumnSchema::new("name", LogicalType::String, false),
        ])
        .unwrap()
    }

    #[test]
    fn test_bind_orders() {
        let schema = bind(&orders_dataset()).unwrap();
        assert_eq!(schema, orders_schema());
        assert_eq!(schema.to_string(), "[(id:integer), (name:string)]");
    }

    #[test]
    fn test_bind_zero_columns() {
        let dataset = Dataset::empty(Arc::new(Schema::empty()));
        let err = bind(&dataset).unwrap_err();
        assert!(matches!(err, BridgeError::Schema { .. }), "{err}");
    }

    #[test]
    fn test_bind_unmappable_type() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("count", DataType::UInt32, false),
        ]));
        let err = bind(&Dataset::empty(schema)).unwrap_err();
        match err {
            BridgeError::Schema { message } => assert!(message.contains("count"), "{message}"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_mapping_table() {
        let cases = [
            (DataType::Boolean, Some(LogicalType::Boolean)),
            (DataType::Int8, Some(LogicalType::Byte)),
            (DataType::Int64, Some(LogicalType::Long)),
            (DataType::Float32, Some(LogicalType::Float)),
            (DataType::LargeUtf8, Some(LogicalType::String)),
            (DataType::LargeBinary, Some(LogicalType::Binary)),
            (DataType::Date64, Some(LogicalType::Date)),
            (
                DataType::Decimal128(10, 2),
                Some(LogicalType::Decimal { precision: 10, scale: 2 }),
            ),
            (DataType::Decimal128(10, -1), None),
            (
                DataType::Timestamp(TimeUnit::Nanosecond, Some("+02:00".into())),
                Some(LogicalType::Timestamp),
            ),
            (DataType::Timestamp(TimeUnit::Second, None), Some(LogicalType::TimestampNtz)),
            (DataType::UInt64, None),
            (DataType::Float16, None),
            (
                DataType::List(Arc::new(Field::new("item", DataType::Int32, true))),
                None,
            ),
        ];
        for (arrow, logical) in cases {
            assert_eq!(LogicalType::from_arrow(&arrow), logical, "{arrow}");
        }
    }

    #[test]
    fn test_canonical_types_round_trip() {
        let all = [
            LogicalType::Boolean,
            LogicalType::Byte,
            LogicalType::Short,
            LogicalType::Integer,
            LogicalType::Long,
            LogicalType::Float,
            LogicalType::Double,
            LogicalType::Decimal { precision: 38, scale: 9 },
            LogicalType::String,
            LogicalType::Binary,
            LogicalType::Date,
            LogicalType::Timestamp,
            LogicalType::TimestampNtz,
        ];
        for logical in all {
            assert_eq!(LogicalType::from_arrow(&logical.to_arrow()), Some(logical));
        }
    }

    #[test]
    fn test_duplicate_and_empty_names() {
        let err = TableSchema::try_new(vec![
            ColumnSchema::new("a", LogicalType::Long, true),
            ColumnSchema::new("a", LogicalType::Long, true),
        ])
        .unwrap_err();
        assert!(matches!(err, BridgeError::Schema { .. }));

        let err = TableSchema::try_new(vec![ColumnSchema::new("", LogicalType::Long, true)])
            .unwrap_err();
        assert!(matches!(err, BridgeError::Schema { .. }));
    }

    #[test]
    fn test_verify_without_expectation() {
        let on_disk = orders_schema();
        assert_eq!(verify(&"t", &on_disk, None).unwrap(), on_disk);
    }

    #[test]
    fn test_verify_reorders_and_widens() {
        let on_disk = orders_schema();
        let expected = TableSchema::try_new(vec![
            ColumnSchema::new("name", LogicalType::String, true),
            ColumnSchema::new("id", LogicalType::Long, false),
        ])
        .unwrap();
        assert_eq!(verify(&"t", &on_disk, Some(&expected)).unwrap(), expected);
    }

    #[test]
    fn test_verify_mismatches() {
        let on_disk = orders_schema();

        let renamed = TableSchema::try_new(vec![
            ColumnSchema::new("id", LogicalType::Integer, false),
            ColumnSchema::new("title", LogicalType::String, false),
        ])
        .unwrap();
        let narrowed = TableSchema::try_new(vec![
            ColumnSchema::new("id", LogicalType::Short, false),
            ColumnSchema::new("name", LogicalType::String, false),
        ])
        .unwrap();
        let extra = TableSchema::try_new(vec![
            ColumnSchema::new("id", LogicalType::Integer, false),
            ColumnSchema::new("name", LogicalType::String, false),
            ColumnSchema::new("total", LogicalType::Double, true),
        ])
        .unwrap();

        for expected in [renamed, narrowed, extra] {
            let err = verify(&"target/sales/orders", &on_disk, Some(&expected)).unwrap_err();
            assert!(matches!(err, BridgeError::SchemaMismatch { .. }), "{err}");
        }
    }

    #[test]
    fn test_verify_nullability() {
        let on_disk = TableSchema::try_new(vec![ColumnSchema::new("id", LogicalType::Integer, true)])
            .unwrap();
        let strict = TableSchema::try_new(vec![ColumnSchema::new("id", LogicalType::Integer, false)])
            .unwrap();
        let err = verify(&"t", &on_disk, Some(&strict)).unwrap_err();
        assert!(matches!(err, BridgeError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_conform_casts_to_canonical() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("label", DataType::LargeUtf8, false),
            Field::new(
                "at",
                DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
                false,
            ),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(LargeStringArray::from(vec!["a", "b"])),
                Arc::new(
                    TimestampNanosecondArray::from(vec![1_000_000_000, 2_000_000_000])
                        .with_timezone("UTC"),
                ),
            ],
        )
        .unwrap();

        let table_schema = TableSchema::try_from_arrow(&schema).unwrap();
        let conformed = table_schema.conform(&batch).unwrap();
        assert_eq!(conformed.column(0).data_type(), &DataType::Utf8);
        let at = conformed
            .column(1)
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(at.value(0), 1_000_000);
        assert_eq!(at.value(1), 2_000_000);
    }

    #[test]
    fn test_conform_by_name() {
        let dataset = orders_dataset();
        let batch = &dataset.batches()[0];
        let reversed = orders_schema().project(&["name", "id"]).unwrap();
        let conformed = reversed.conform(batch).unwrap();
        assert_eq!(conformed.schema().field(0).name(), "name");
        let ids = conformed.column(1).as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(ids.len(), 3);
    }
}
