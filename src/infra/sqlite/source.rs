use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::entities::catalog::FilterChoice;
use crate::domain::entities::query::{ComposedQuery, Predicate, Slice};
use crate::domain::entities::schema::{Schema, SchemaField};
use crate::infra::sqlite::queries::{count_matches, distinct_field_values, fetch_rows, TableLayout};
use crate::infra::sqlite::schema::{open_read_only, table_columns};
use crate::usecase::ports::source::{DataSource, Row, SourceError};

/// One SQLite table exposed as a data source. A fresh read-only connection is
/// opened per call, so the source can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    pub db_path: PathBuf,
    schema: Schema,
    layout: TableLayout,
}

fn uses_full_text(predicates: &[Predicate]) -> bool {
    predicates.iter().any(|predicate| match predicate {
        Predicate::FullText { .. } => true,
        Predicate::Any(inner) => uses_full_text(inner),
        Predicate::Lookup { .. } => false,
    })
}

impl SqliteSource {
    /// Reads the schema of `table` from the database at `db_path`.
    pub fn open(db_path: &Path, table: &str) -> Result<Self> {
        let conn = open_read_only(db_path)?;
        let columns = table_columns(&conn, table)?;
        let schema = Schema::new(
            table,
            columns
                .iter()
                .map(|column| SchemaField::stored(column.name.clone()))
                .collect(),
        );
        Ok(Self {
            db_path: db_path.to_path_buf(),
            schema,
            layout: TableLayout {
                table: table.to_string(),
                declared_types: columns
                    .into_iter()
                    .map(|column| (column.name, column.declared_type))
                    .collect(),
                computed: Vec::new(),
            },
        })
    }

    /// Adds a value computed by a SQL expression over the row, e.g.
    /// `first_name || ' ' || last_name`. It can be displayed but not queried.
    pub fn with_computed(
        mut self,
        name: &str,
        expr: &str,
        short_description: Option<&str>,
    ) -> Self {
        self.schema
            .fields
            .push(SchemaField::computed(name, short_description));
        self.layout
            .computed
            .push((name.to_string(), expr.to_string()));
        self
    }

    /// Declares labels for coded values of `field`, giving it a display variant.
    pub fn with_choices<I, V, L>(mut self, field: &str, choices: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        if let Some(schema_field) = self.schema.fields.iter_mut().find(|f| f.name == field) {
            *schema_field = schema_field.clone().with_choices(choices);
        }
        self
    }

    pub fn with_verbose_name(mut self, field: &str, verbose_name: &str) -> Self {
        if let Some(schema_field) = self.schema.fields.iter_mut().find(|f| f.name == field) {
            schema_field.verbose_name = verbose_name.to_string();
        }
        self
    }

    pub fn with_verbose_name_plural(mut self, verbose_name_plural: &str) -> Self {
        self.schema.verbose_name_plural = verbose_name_plural.to_string();
        self
    }
}

impl DataSource for SqliteSource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn count(&self, query: &ComposedQuery) -> Result<u64, SourceError> {
        if uses_full_text(&query.predicates) {
            return Err(SourceError::Unsupported("full-text search".to_string()));
        }
        let conn =
            open_read_only(&self.db_path).map_err(|err| SourceError::Message(err.to_string()))?;
        count_matches(&conn, &self.schema, &self.layout, query)
            .map_err(|err| SourceError::Message(format!("{err:#}")))
    }

    fn fetch(&self, query: &ComposedQuery, slice: Slice) -> Result<Vec<Row>, SourceError> {
        if uses_full_text(&query.predicates) {
            return Err(SourceError::Unsupported("full-text search".to_string()));
        }
        let conn =
            open_read_only(&self.db_path).map_err(|err| SourceError::Message(err.to_string()))?;
        fetch_rows(&conn, &self.schema, &self.layout, query, slice)
            .map_err(|err| SourceError::Message(format!("{err:#}")))
    }

    fn distinct_values(&self, field: &str) -> Result<Vec<FilterChoice>, SourceError> {
        let conn =
            open_read_only(&self.db_path).map_err(|err| SourceError::Message(err.to_string()))?;
        let values = distinct_field_values(&conn, &self.schema, &self.layout, field)
            .map_err(|err| SourceError::Message(format!("{err:#}")))?;
        let schema_field = self.schema.field(field);
        Ok(values
            .into_iter()
            .map(|(stored, value)| {
                let rendered = value.to_cell_text();
                let label = schema_field
                    .and_then(|schema_field| {
                        schema_field
                            .choice_label(&stored)
                            .or_else(|| schema_field.choice_label(&rendered))
                    })
                    .map(str::to_string)
                    .unwrap_or(rendered);
                FilterChoice::new(stored, label)
            })
            .collect())
    }
}
