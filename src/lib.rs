//! Declarative table-data endpoint.
//!
//! A [`ColumnCatalog`] describes the columns of a table. Each request's query
//! string is parsed into [`RequestParameters`], composed into a query against a
//! [`DataSource`], and answered with either the table configuration or one page
//! of rendered rows plus the total match count.

pub mod domain;
pub mod infra;
pub mod ui;
pub mod usecase;

#[cfg(test)]
mod tests;

pub use domain::entities::catalog::{
    CatalogBuilder, Column, ColumnCatalog, FilterChoice, FilterValues, ValueResolver,
};
pub use domain::entities::ordering::{Direction, OrderToken};
pub use domain::entities::page::{ConfigPayload, DataPayload, Payload, ResultPage};
pub use domain::entities::params::RequestParameters;
pub use domain::entities::query::{ComposedQuery, Predicate};
pub use domain::entities::schema::{Schema, SchemaField};
pub use domain::entities::value::CellValue;
pub use domain::error::{ClientParameterError, ConfigurationError};
pub use infra::memory::source::MemorySource;
pub use infra::sqlite::source::SqliteSource;
pub use ui::page::{PageContext, PageOutcome, TablePage};
pub use usecase::error::TableError;
pub use usecase::ports::source::{DataSource, Row, SourceError};
pub use usecase::services::response::TableResponse;
pub use usecase::services::view::TableView;
