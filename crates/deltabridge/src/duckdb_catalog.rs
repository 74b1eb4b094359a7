// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! DuckDB as a registration catalog.

use crate::catalog::{BoundParam, CatalogConnection, RegistrationRecord};
use crate::error::ConnectionError;
use async_trait::async_trait;
use diagnostics::log_debug;
use duckdb::Connection;
use std::path::Path;

/// A DuckDB connection that opens a transaction on the first statement.
pub struct DuckDbConnection {
    conn: Connection,
    in_transaction: bool,
}

impl std::fmt::Debug for DuckDbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbConnection")
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl DuckDbConnection {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConnectionError> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, ConnectionError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            in_transaction: false,
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Registrations in `table`, ordered by schema and table name.
    ///
    /// A registry table that was never created reads as empty.
    pub fn registrations(&self, table: &str) -> Result<Vec<RegistrationRecord>, ConnectionError> {
        let exists: i64 = self.conn.query_row(
            "SELECT count(*) FROM information_schema.tables WHERE table_name = ?",
            duckdb::params![table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT schema_name, table_name, table_location FROM {table} \
             ORDER BY schema_name, table_name"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(RegistrationRecord {
                namespace: row.get(0)?,
                name: row.get(1)?,
                location: row.get(2)?,
            })
        })?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn begin(&mut self) -> Result<(), ConnectionError> {
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN TRANSACTION")?;
            self.in_transaction = true;
        }
        Ok(())
    }

    fn finish(&mut self, statement: &str) -> Result<(), ConnectionError> {
        if !self.in_transaction {
            return Ok(());
        }
        // The transaction is over whether or not the statement succeeds.
        self.in_transaction = false;
        self.conn.execute_batch(statement)?;
        Ok(())
    }
}

#[async_trait]
impl CatalogConnection for DuckDbConnection {
    async fn execute(&mut self, sql: &str, params: &[BoundParam]) -> Result<u64, ConnectionError> {
        self.begin()?;
        let names = params.iter().map(|p| p.name).collect::<Vec<_>>().join(", ");
        log_debug!("DuckDB execute binding {params}", params: names.as_str());
        let affected = self
            .conn
            .execute(sql, duckdb::params_from_iter(params.iter().map(|p| p.value.as_str())))?;
        Ok(affected as u64)
    }

    async fn commit(&mut self) -> Result<(), ConnectionError> {
        self.finish("COMMIT")
    }

    async fn rollback(&mut self) -> Result<(), ConnectionError> {
        self.finish("ROLLBACK")
    }
}
