use serde::Serialize;

use crate::domain::entities::page::ConfigPayload;
use crate::usecase::error::TableError;
use crate::usecase::ports::source::DataSource;
use crate::usecase::services::response::TableResponse;
use crate::usecase::services::view::TableView;

/// Everything the initial table page template needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContext {
    pub verbose_name_plural: String,
    pub ajax_url: String,
    pub config: ConfigPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Render the page shell with this context.
    Page(PageContext),
    /// Reply to an AJAX refresh with this JSON response.
    Json(TableResponse),
}

/// Page-rendering adapter over a [`TableView`]. Template rendering itself
/// belongs to the caller.
pub struct TablePage<'a, S> {
    view: &'a TableView<S>,
}

impl<'a, S: DataSource> TablePage<'a, S> {
    pub fn new(view: &'a TableView<S>) -> Self {
        Self { view }
    }

    pub fn context(&self) -> Result<PageContext, TableError> {
        let catalog = self.view.catalog();
        Ok(PageContext {
            verbose_name_plural: catalog.verbose_name_plural().to_string(),
            ajax_url: catalog.ajax_url().to_string(),
            config: self.view.responses().config()?,
        })
    }

    /// AJAX requests get the JSON payload; anything else gets the page context.
    pub fn dispatch(
        &self,
        is_ajax: bool,
        query_string: &str,
        locale: &str,
    ) -> Result<PageOutcome, TableError> {
        if is_ajax {
            self.view.handle(query_string, locale).map(PageOutcome::Json)
        } else {
            self.context().map(PageOutcome::Page)
        }
    }
}
