use tracing::error;

use crate::domain::entities::catalog::{Column, ColumnCatalog, ValueResolver};
use crate::domain::entities::page::ResultPage;
use crate::domain::entities::query::{ComposedQuery, Slice};
use crate::domain::entities::value::CellValue;
use crate::domain::error::ClientParameterError;
use crate::usecase::error::TableError;
use crate::usecase::ports::source::{DataSource, Row, SourceError};

pub struct ResultMaterializer<'a, S: ?Sized> {
    catalog: &'a ColumnCatalog,
    source: &'a S,
}

impl<'a, S: DataSource + ?Sized> ResultMaterializer<'a, S> {
    pub fn new(catalog: &'a ColumnCatalog, source: &'a S) -> Self {
        Self { catalog, source }
    }

    /// Total matches of the unpaginated query. Ordering is dropped.
    pub fn count_all(&self, query: &ComposedQuery) -> Result<u64, SourceError> {
        let unordered = ComposedQuery {
            ordering: Vec::new(),
            ..query.clone()
        };
        self.source.count(&unordered).inspect_err(|err| {
            error!(%err, "count query failed");
        })
    }

    pub fn page(
        &self,
        query: &ComposedQuery,
        page_index: u64,
        page_size: u64,
    ) -> Result<Vec<Row>, TableError> {
        let offset = page_index
            .checked_mul(page_size)
            .ok_or(ClientParameterError::PageOutOfRange { page: page_index })?;
        let rows = self
            .source
            .fetch(
                query,
                Slice {
                    offset,
                    limit: page_size,
                },
            )
            .inspect_err(|err| {
                error!(%err, offset, page_size, "page query failed");
            })?;
        Ok(rows)
    }

    pub fn results(
        &self,
        query: &ComposedQuery,
        page_index: u64,
    ) -> Result<ResultPage, TableError> {
        let records = self.page(query, page_index, self.catalog.results_per_page())?;
        let rows = records.iter().map(|row| self.render_row(row)).collect();
        let count = self.count_all(query)?;
        Ok(ResultPage { rows, count })
    }

    pub fn render_row(&self, row: &Row) -> Vec<String> {
        self.catalog
            .columns()
            .iter()
            .map(|column| resolve_cell(row, column).to_cell_text())
            .collect()
    }
}

/// Custom resolver, then display variant, then the raw attribute (invoking
/// it when it is an accessor). Missing values resolve to `Null`.
pub fn resolve_cell(row: &Row, column: &Column) -> CellValue {
    match column.resolver() {
        ValueResolver::Custom(resolver) => resolver(row),
        ValueResolver::DisplayVariant => match row.display(column.name()) {
            Some(display) => display.clone(),
            None => raw_value(row, column.name()),
        },
        ValueResolver::RawField => raw_value(row, column.name()),
    }
}

fn raw_value(row: &Row, name: &str) -> CellValue {
    row.attribute(name)
        .map(|attribute| attribute.resolve())
        .unwrap_or(CellValue::Null)
}
