use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::params_from_iter;

use crate::infra::sqlite::schema::{open_connection, quote_ident};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub table: String,
    pub row_count: i64,
}

/// Loads a CSV file into a new TEXT-column table named `table`.
///
/// With `replace`, an existing table of that name is dropped first;
/// otherwise an existing table is an error.
pub fn import_csv_to_table(
    db_path: &Path,
    csv_path: &Path,
    table: &str,
    replace: bool,
) -> Result<ImportResult> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers from csv: {}", csv_path.display()))?
        .clone();

    if headers.is_empty() {
        anyhow::bail!("csv header is required")
    }
    if let Some(position) = headers.iter().position(|name| name.trim().is_empty()) {
        anyhow::bail!("csv header {} is empty", position + 1)
    }

    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start transaction")?;

    let table_sql = quote_ident(table);
    if replace {
        tx.execute(&format!("DROP TABLE IF EXISTS {table_sql}"), [])
            .with_context(|| format!("failed to drop table `{table}`"))?;
    }
    let column_defs = headers
        .iter()
        .map(|name| format!("{} TEXT", quote_ident(name.trim())))
        .collect::<Vec<_>>()
        .join(", ");
    tx.execute(&format!("CREATE TABLE {table_sql} ({column_defs})"), [])
        .with_context(|| format!("failed to create table `{table}`"))?;

    let placeholders = vec!["?"; headers.len()].join(", ");
    let mut insert_row = tx
        .prepare(&format!("INSERT INTO {table_sql} VALUES ({placeholders})"))
        .context("failed to prepare row insert")?;

    let mut row_count = 0_i64;
    let header_len = headers.len();
    for record in reader.records() {
        let record = record.context("failed to parse csv record")?;
        let values = (0..header_len).map(|col_idx| record.get(col_idx).unwrap_or(""));
        insert_row
            .execute(params_from_iter(values))
            .context("failed to insert row")?;
        row_count += 1;
    }
    drop(insert_row);

    tx.commit().context("failed to commit import transaction")?;

    Ok(ImportResult {
        table: table.to_string(),
        row_count,
    })
}
