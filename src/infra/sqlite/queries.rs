use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{types::Value, Connection};

use crate::domain::entities::lookup::{Lookup, LookupOp};
use crate::domain::entities::ordering::OrderToken;
use crate::domain::entities::query::{ComposedQuery, Predicate, Slice};
use crate::domain::entities::schema::{Schema, SchemaField};
use crate::domain::entities::value::CellValue;
use crate::infra::sqlite::schema::quote_ident;
use crate::usecase::ports::source::Row;

const ROWID_ALIAS: &str = "__rowid";

/// Physical details of the table a schema was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub table: String,
    /// Declared SQL type per stored field, in schema order.
    pub declared_types: Vec<(String, String)>,
    /// SQL expression per computed field.
    pub computed: Vec<(String, String)>,
}

impl TableLayout {
    fn declared_type(&self, field: &str) -> &str {
        self.declared_types
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, declared)| declared.as_str())
            .unwrap_or_default()
    }
}

fn column_sql(schema: &Schema, field: &str) -> Result<String> {
    if schema.stored_field(field).is_none() {
        anyhow::bail!("`{field}` is not a stored field of `{}`", schema.name)
    }
    Ok(format!("t.{}", quote_ident(field)))
}

fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn lookup_sql(
    schema: &Schema,
    lookup: &Lookup,
    value: &str,
    params: &mut Vec<Value>,
) -> Result<String> {
    let column = column_sql(schema, &lookup.field)?;
    let text = format!("CAST({column} AS TEXT)");
    let escaped = escape_like(value);
    let sql = match lookup.op {
        LookupOp::Exact => {
            params.push(Value::Text(value.to_string()));
            format!("{column} = ?")
        }
        LookupOp::IExact => {
            params.push(Value::Text(value.to_string()));
            format!("{text} = ? COLLATE NOCASE")
        }
        LookupOp::Contains => {
            params.push(Value::Text(value.to_string()));
            format!("instr({text}, ?) > 0")
        }
        LookupOp::StartsWith => {
            params.push(Value::Text(value.to_string()));
            format!("instr({text}, ?) = 1")
        }
        LookupOp::EndsWith => {
            params.push(Value::Text(value.to_string()));
            params.push(Value::Text(value.to_string()));
            format!("substr({text}, -length(?)) = ?")
        }
        LookupOp::IContains => {
            params.push(Value::Text(format!("%{escaped}%")));
            format!("{text} LIKE ? ESCAPE '\\'")
        }
        LookupOp::IStartsWith => {
            params.push(Value::Text(format!("{escaped}%")));
            format!("{text} LIKE ? ESCAPE '\\'")
        }
        LookupOp::IEndsWith => {
            params.push(Value::Text(format!("%{escaped}")));
            format!("{text} LIKE ? ESCAPE '\\'")
        }
    };
    Ok(sql)
}

fn predicate_sql(schema: &Schema, predicate: &Predicate, params: &mut Vec<Value>) -> Result<String> {
    match predicate {
        Predicate::Lookup { lookup, value } => lookup_sql(schema, lookup, value, params),
        Predicate::Any(predicates) if predicates.is_empty() => Ok("0".to_string()),
        Predicate::Any(predicates) => Ok(format!(
            "({})",
            predicates
                .iter()
                .map(|predicate| predicate_sql(schema, predicate, params))
                .collect::<Result<Vec<_>>>()?
                .join(" OR ")
        )),
        Predicate::FullText { .. } => {
            anyhow::bail!("full-text search is not supported by the sqlite source")
        }
    }
}

/// `WHERE` clause (possibly empty) and its bound parameters.
pub fn where_sql(schema: &Schema, query: &ComposedQuery) -> Result<(String, Vec<Value>)> {
    let mut params = Vec::new();
    if query.predicates.is_empty() {
        return Ok((String::new(), params));
    }
    let clauses = query
        .predicates
        .iter()
        .map(|predicate| predicate_sql(schema, predicate, &mut params))
        .collect::<Result<Vec<_>>>()?;
    Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
}

/// `ORDER BY` clause, always ending with rowid so pages are stable.
pub fn order_sql(schema: &Schema, ordering: &[OrderToken]) -> Result<String> {
    let mut keys = ordering
        .iter()
        .map(|token| {
            let direction = if token.descending { "DESC" } else { "ASC" };
            Ok(format!("{} {direction}", column_sql(schema, &token.field)?))
        })
        .collect::<Result<Vec<_>>>()?;
    keys.push("t.rowid ASC".to_string());
    Ok(format!(" ORDER BY {}", keys.join(", ")))
}

pub fn count_matches(
    conn: &Connection,
    schema: &Schema,
    layout: &TableLayout,
    query: &ComposedQuery,
) -> Result<u64> {
    let (where_clause, params) = where_sql(schema, query)?;
    let table = quote_ident(&layout.table);
    let sql = if query.distinct {
        format!("SELECT COUNT(*) FROM (SELECT DISTINCT t.rowid FROM {table} AS t{where_clause})")
    } else {
        format!("SELECT COUNT(*) FROM {table} AS t{where_clause}")
    };
    let count: i64 = conn
        .query_row(&sql, rusqlite::params_from_iter(params), |row| row.get(0))
        .context("failed to query filtered row count")?;
    Ok(u64::try_from(count).unwrap_or_default())
}

pub fn fetch_rows(
    conn: &Connection,
    schema: &Schema,
    layout: &TableLayout,
    query: &ComposedQuery,
    slice: Slice,
) -> Result<Vec<Row>> {
    let (where_clause, mut params) = where_sql(schema, query)?;
    let order_clause = order_sql(schema, &query.ordering)?;

    let mut select = vec![format!("t.rowid AS {}", quote_ident(ROWID_ALIAS))];
    select.extend(
        layout
            .declared_types
            .iter()
            .map(|(name, _)| format!("t.{}", quote_ident(name))),
    );
    select.extend(
        layout
            .computed
            .iter()
            .map(|(name, expr)| format!("({expr}) AS {}", quote_ident(name))),
    );

    let distinct = if query.distinct { "DISTINCT " } else { "" };
    let sql = format!(
        "SELECT {distinct}{} FROM {} AS t{where_clause}{order_clause} LIMIT ? OFFSET ?",
        select.join(", "),
        quote_ident(&layout.table),
    );
    params.push(Value::Integer(i64::try_from(slice.limit).unwrap_or(i64::MAX)));
    params.push(Value::Integer(i64::try_from(slice.offset).unwrap_or(i64::MAX)));

    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare page query")?;
    let mut result_rows = stmt
        .query(rusqlite::params_from_iter(params))
        .context("failed to run page query")?;

    let mut rows = Vec::new();
    while let Some(result_row) = result_rows.next().context("failed to read page row")? {
        let id: i64 = result_row.get(0).context("failed to read rowid")?;
        let mut row = Row::new(id);
        for (idx, (name, declared)) in layout.declared_types.iter().enumerate() {
            let value: Value = result_row
                .get(idx + 1)
                .with_context(|| format!("failed to read `{name}`"))?;
            row = row.with(name.clone(), to_cell_value(value, declared));
        }
        let computed_start = layout.declared_types.len() + 1;
        for (idx, (name, _)) in layout.computed.iter().enumerate() {
            let value: Value = result_row
                .get(computed_start + idx)
                .with_context(|| format!("failed to read computed `{name}`"))?;
            row = row.with(name.clone(), to_cell_value(value, ""));
        }
        attach_displays(&mut row, &schema.fields);
        rows.push(row);
    }
    Ok(rows)
}

fn attach_displays(row: &mut Row, fields: &[SchemaField]) {
    for field in fields.iter().filter(|field| field.has_display_variant()) {
        let raw = row
            .attribute(&field.name)
            .map(|attribute| attribute.resolve().to_cell_text())
            .unwrap_or_default();
        if let Some(label) = field.choice_label(&raw) {
            row.displays
                .insert(field.name.clone(), CellValue::from(label));
        }
    }
}

/// Distinct non-null values of `field` as `(stored text, decoded value)`.
///
/// The stored text is what an equality lookup compares against, so it is
/// the value a filter choice must carry; the decoded value is for display.
pub fn distinct_field_values(
    conn: &Connection,
    schema: &Schema,
    layout: &TableLayout,
    field: &str,
) -> Result<Vec<(String, CellValue)>> {
    let column = column_sql(schema, field)?;
    let sql = format!(
        "SELECT DISTINCT {column} FROM {} AS t WHERE {column} IS NOT NULL ORDER BY {column} ASC",
        quote_ident(&layout.table)
    );
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare distinct values query")?;
    let declared = layout.declared_type(field);
    let values = stmt
        .query_map([], |row| row.get::<_, Value>(0))
        .context("failed to query distinct values")?
        .map(|value| value.map(|value| (stored_text(&value), to_cell_value(value, declared))))
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect distinct values")?;
    Ok(values)
}

/// Text form of a stored value as SQLite itself would cast it.
fn stored_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(value) => value.to_string(),
        Value::Real(value) => value.to_string(),
        Value::Text(text) => text.clone(),
        Value::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Converts a stored value, using the declared column type for dates and booleans.
pub fn to_cell_value(value: Value, declared_type: &str) -> CellValue {
    let declared = declared_type.to_ascii_uppercase();
    match value {
        Value::Null => CellValue::Null,
        Value::Integer(value) if declared.contains("BOOL") => CellValue::Bool(value != 0),
        Value::Integer(value) => CellValue::Integer(value),
        Value::Real(value) => CellValue::Real(value),
        Value::Text(text) if declared.contains("DATETIME") || declared.contains("TIMESTAMP") => {
            ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(&text, format).ok())
                .map_or(CellValue::Text(text), CellValue::DateTime)
        }
        Value::Text(text) if declared.contains("DATE") => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .map_or(CellValue::Text(text), CellValue::Date),
        Value::Text(text) => CellValue::Text(text),
        Value::Blob(bytes) => CellValue::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}
