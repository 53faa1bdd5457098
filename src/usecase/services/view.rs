use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::domain::entities::catalog::{CatalogBuilder, ColumnCatalog};
use crate::domain::entities::params::RequestParameters;
use crate::domain::error::ConfigurationError;
use crate::usecase::error::TableError;
use crate::usecase::ports::source::DataSource;
use crate::usecase::services::response::{ResponseBuilder, TableResponse};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// A table endpoint: one shared catalog over one data source.
pub struct TableView<S> {
    catalog: Arc<ColumnCatalog>,
    source: S,
}

impl<S: DataSource> TableView<S> {
    pub fn new(catalog: Arc<ColumnCatalog>, source: S) -> Self {
        Self { catalog, source }
    }

    /// Validates `builder` against the source schema.
    pub fn build(builder: CatalogBuilder, source: S) -> Result<Self, ConfigurationError> {
        let catalog = builder.build(source.schema())?;
        Ok(Self::new(Arc::new(catalog), source))
    }

    pub fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn responses(&self) -> ResponseBuilder<'_, S> {
        ResponseBuilder::new(&self.catalog, &self.source)
    }

    pub fn parse(&self, query_string: &str) -> Result<RequestParameters, TableError> {
        Ok(RequestParameters::parse(
            query_string,
            self.catalog.columns().len(),
        )?)
    }

    /// Answers one request. Malformed parameters become a 400 response;
    /// configuration and data-source failures are returned as errors.
    pub fn handle(&self, query_string: &str, locale: &str) -> Result<TableResponse, TableError> {
        let outcome = self
            .parse(query_string)
            .and_then(|params| self.responses().respond(&params, locale));
        match outcome {
            Err(TableError::ClientParameter(err)) => {
                warn!(%err, query_string, "rejected table request");
                TableResponse::json(
                    400,
                    &ErrorBody {
                        error: err.to_string(),
                    },
                    self.catalog.access_control_allow_origin(),
                )
            }
            other => other,
        }
    }
}
