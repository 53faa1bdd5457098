use serde::Serialize;
use tracing::debug;

use crate::domain::entities::catalog::ColumnCatalog;
use crate::domain::entities::ordering::Direction;
use crate::domain::entities::page::{ConfigPayload, DataPayload, Payload};
use crate::domain::entities::params::RequestParameters;
use crate::usecase::error::TableError;
use crate::usecase::ports::source::DataSource;
use crate::usecase::services::composer::QueryComposer;
use crate::usecase::services::materializer::ResultMaterializer;

pub const CONTENT_TYPE: &str = "application/json";

/// Transport-neutral response: status, headers and a serialized body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl TableResponse {
    pub fn json<T: Serialize>(
        status: u16,
        payload: &T,
        allow_origin: Option<&str>,
    ) -> Result<Self, TableError> {
        let body = serde_json::to_string(payload)?;
        let mut headers = vec![
            ("Content-Type".to_string(), CONTENT_TYPE.to_string()),
            (
                "Cache-Control".to_string(),
                "no-cache, no-store, must-revalidate".to_string(),
            ),
        ];
        if let Some(origin) = allow_origin {
            headers.push(("Access-Control-Allow-Origin".to_string(), origin.to_string()));
        }
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct ResponseBuilder<'a, S: ?Sized> {
    catalog: &'a ColumnCatalog,
    source: &'a S,
}

impl<'a, S: DataSource + ?Sized> ResponseBuilder<'a, S> {
    pub fn new(catalog: &'a ColumnCatalog, source: &'a S) -> Self {
        Self { catalog, source }
    }

    pub fn config(&self) -> Result<ConfigPayload, TableError> {
        let columns = self.catalog.columns();
        let filters = columns
            .iter()
            .map(|column| column.filter_values(|field| self.source.distinct_values(field)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ConfigPayload {
            columns: columns
                .iter()
                .map(|column| column.verbose_label().to_string())
                .collect(),
            columns_widths: columns
                .iter()
                .map(|column| column.width().to_string())
                .collect(),
            search_enabled: self.catalog.search_enabled(),
            sortables: columns
                .iter()
                .map(|column| !column.ordering_for(Direction::Ascending).is_empty())
                .collect(),
            filters,
            results_per_page: self.catalog.results_per_page(),
        })
    }

    pub fn data(
        &self,
        params: &RequestParameters,
        locale: &str,
    ) -> Result<DataPayload, TableError> {
        let query = QueryComposer::new(self.catalog).compose(self.source, params, locale);
        debug!(?query, page = params.page, "composed query");
        let page = ResultMaterializer::new(self.catalog, self.source).results(&query, params.page)?;
        Ok(page.into())
    }

    pub fn build(&self, params: &RequestParameters, locale: &str) -> Result<Payload, TableError> {
        if params.wants_config {
            self.config().map(Payload::Config)
        } else {
            self.data(params, locale).map(Payload::Data)
        }
    }

    pub fn respond(
        &self,
        params: &RequestParameters,
        locale: &str,
    ) -> Result<TableResponse, TableError> {
        let payload = self.build(params, locale)?;
        TableResponse::json(200, &payload, self.catalog.access_control_allow_origin())
    }
}
