// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Result, bail};
use deltabridge::CatalogDialect;

use crate::common::ShipContext;

/// List the tables registered in the DuckDB registry table.
pub fn registry_command(ship: &ShipContext) -> Result<String> {
    let CatalogDialect::RegistryTable { table } = &ship.config.catalog else {
        bail!("The registry command needs the registry_table catalog dialect");
    };

    let catalog = ship.open_catalog()?;
    let records = catalog.registrations(table)?;
    if records.is_empty() {
        return Ok("No registered tables\n".to_string());
    }

    let mut out = String::new();
    for record in records {
        out.push_str(&format!("{}.{}\t{}\n", record.namespace, record.name, record.location));
    }
    Ok(out)
}
