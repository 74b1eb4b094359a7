// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Result, anyhow};
use arrow_cast::pretty::pretty_format_batches;
use deltabridge::TableSlice;
use diagnostics::log_debug;

use crate::common::{CliContext, ShipContext};

/// Read `namespace.table`, optionally projected, as a printable table.
pub async fn read_command(
    ship: &ShipContext,
    namespace: &str,
    table: &str,
    columns: Option<Vec<String>>,
) -> Result<String> {
    log_debug!("Reading {namespace}.{table}", namespace: namespace, table: table);

    let mut slice = TableSlice::new(namespace, table);
    if let Some(columns) = columns {
        slice = slice.with_columns(columns);
    }

    let handler = ship.handler();
    let mut catalog = ship.open_catalog()?;
    let dataset = handler
        .load_input(&CliContext::default(), &slice, &mut catalog)
        .await?;

    let formatted = pretty_format_batches(dataset.batches())
        .map_err(|e| anyhow!("Failed to format results: {e}"))?;
    Ok(format!("{formatted}\n"))
}
