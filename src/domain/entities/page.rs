use serde::Serialize;

use crate::domain::entities::catalog::FilterChoice;

/// One page of rendered rows plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultPage {
    pub rows: Vec<Vec<String>>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigPayload {
    pub columns: Vec<String>,
    pub columns_widths: Vec<String>,
    pub search_enabled: bool,
    pub sortables: Vec<bool>,
    pub filters: Vec<Vec<FilterChoice>>,
    pub results_per_page: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataPayload {
    pub results: Vec<Vec<String>>,
    pub count: u64,
}

impl From<ResultPage> for DataPayload {
    fn from(page: ResultPage) -> Self {
        Self {
            results: page.rows,
            count: page.count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Config(ConfigPayload),
    Data(DataPayload),
}
