// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Catalog registration
//!
//! After a table is written, the SQL engine is told where it lives so queries
//! can name it. Registration runs over a caller-owned transactional
//! connection: one registration statement, then commit. A failure is returned
//! as a [`RegistrationError`] for the caller to log; it never undoes the write.
//!
//! Two dialects are supported. [`CatalogDialect::Procedure`] calls the
//! engine's `register_table` procedure, which refuses to register a name
//! twice, so the existing registration is dropped first.
//! [`CatalogDialect::RegistryTable`] upserts into a registry table.

use crate::error::{ConnectionError, RegistrationError};
use crate::identity::{TableIdentity, TableLocation};
use async_trait::async_trait;
use diagnostics::{log_debug, log_info, log_warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named statement parameter. Statements use positional `?` placeholders
/// bound in parameter order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParam {
    pub name: &'static str,
    pub value: String,
}

impl BoundParam {
    pub fn new<S: Into<String>>(name: &'static str, value: S) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// A transactional SQL connection supplied by the caller.
///
/// The first statement opens a transaction that lasts until `commit` or `rollback`.
#[async_trait]
pub trait CatalogConnection: Send {
    /// Execute one statement, returning the number of affected rows.
    async fn execute(&mut self, sql: &str, params: &[BoundParam]) -> Result<u64, ConnectionError>;

    async fn commit(&mut self) -> Result<(), ConnectionError>;

    async fn rollback(&mut self) -> Result<(), ConnectionError>;
}

/// What gets registered: the table identity and where its files are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRecord {
    pub namespace: String,
    pub name: String,
    pub location: String,
}

impl RegistrationRecord {
    pub fn new(identity: &TableIdentity, location: &TableLocation) -> Self {
        Self {
            namespace: identity.namespace().to_string(),
            name: identity.name().to_string(),
            location: location.to_string(),
        }
    }

    fn identity_params(&self) -> Vec<BoundParam> {
        vec![
            BoundParam::new("schema_name", self.namespace.as_str()),
            BoundParam::new("table_name", self.name.as_str()),
        ]
    }

    fn params(&self) -> Vec<BoundParam> {
        let mut params = self.identity_params();
        params.push(BoundParam::new("table_location", self.location.as_str()));
        params
    }
}

impl fmt::Display for RegistrationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} at {}", self.namespace, self.name, self.location)
    }
}

/// How the engine's catalog accepts registrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogDialect {
    /// `CALL <catalog>.system.register_table(...)`, insert-only.
    Procedure { catalog: String },
    /// `INSERT OR REPLACE` into a registry table.
    RegistryTable { table: String },
}

impl Default for CatalogDialect {
    fn default() -> Self {
        CatalogDialect::Procedure {
            catalog: "delta".to_string(),
        }
    }
}

impl CatalogDialect {
    /// The identifier interpolated into statements.
    pub fn identifier(&self) -> &str {
        match self {
            CatalogDialect::Procedure { catalog } => catalog,
            CatalogDialect::RegistryTable { table } => table,
        }
    }

    /// Statement run before registering, its parameters, and whether its
    /// failure is tolerated.
    fn prepare_statement(&self, record: &RegistrationRecord) -> (String, Vec<BoundParam>, bool) {
        match self {
            CatalogDialect::Procedure { catalog } => (
                format!(
                    "CALL {catalog}.system.unregister_table(schema_name => ?, table_name => ?)"
                ),
                record.identity_params(),
                true,
            ),
            CatalogDialect::RegistryTable { table } => (
                format!(
                    "CREATE TABLE IF NOT EXISTS {table} (\
                     schema_name VARCHAR NOT NULL, \
                     table_name VARCHAR NOT NULL, \
                     table_location VARCHAR NOT NULL, \
                     PRIMARY KEY (schema_name, table_name))"
                ),
                Vec::new(),
                false,
            ),
        }
    }

    pub fn register_statement(&self) -> String {
        match self {
            CatalogDialect::Procedure { catalog } => format!(
                "CALL {catalog}.system.register_table(\
                 schema_name => ?, table_name => ?, table_location => ?)"
            ),
            CatalogDialect::RegistryTable { table } => format!(
                "INSERT OR REPLACE INTO {table} (schema_name, table_name, table_location) \
                 VALUES (?, ?, ?)"
            ),
        }
    }
}

/// Submits registration records over a caller's connection.
#[derive(Debug, Clone, Default)]
pub struct CatalogRegistrar {
    dialect: CatalogDialect,
}

impl CatalogRegistrar {
    pub fn new(dialect: CatalogDialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &CatalogDialect {
        &self.dialect
    }

    /// Register `record`, committing on success and rolling back on failure.
    #[must_use = "a failed registration leaves the table unqueryable and should be logged"]
    pub async fn register<C>(
        &self,
        connection: &mut C,
        record: &RegistrationRecord,
    ) -> Result<(), RegistrationError>
    where
        C: CatalogConnection + ?Sized,
    {
        match self.submit(connection, record).await {
            Ok(()) => {
                let record_str = record.to_string();
                log_info!("Registered table {record}", record: record_str.as_str());
                Ok(())
            }
            Err(err) => {
                if let Err(rollback) = connection.rollback().await {
                    let rollback_str = rollback.to_string();
                    log_warn!("Rollback after failed registration failed: {error}", error: rollback_str.as_str());
                }
                Err(err)
            }
        }
    }

    async fn submit<C>(&self, connection: &mut C, record: &RegistrationRecord) -> Result<(), RegistrationError>
    where
        C: CatalogConnection + ?Sized,
    {
        let (sql, params, tolerate_failure) = self.dialect.prepare_statement(record);
        log_debug!("Catalog statement: {sql}", sql: sql.as_str());
        if let Err(source) = connection.execute(&sql, &params).await {
            if !tolerate_failure {
                return Err(RegistrationError::Statement {
                    record: record.clone(),
                    source,
                });
            }
            // Nothing was registered under this name yet. The failed statement
            // aborts the open transaction, so start a fresh one.
            let message = source.to_string();
            log_debug!("Ignoring failed unregister: {error}", error: message.as_str());
            connection
                .rollback()
                .await
                .map_err(|source| RegistrationError::Statement {
                    record: record.clone(),
                    source,
                })?;
        }

        let sql = self.dialect.register_statement();
        log_debug!("Catalog statement: {sql}", sql: sql.as_str());
        connection
            .execute(&sql, &record.params())
            .await
            .map_err(|source| RegistrationError::Statement {
                record: record.clone(),
                source,
            })?;

        connection
            .commit()
            .await
            .map_err(|source| RegistrationError::Commit {
                record: record.clone(),
                source,
            })
    }
}
