use thiserror::Error;

/// Raised while building or validating a catalog. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("column `{column}`: each filter must be a value/verbose pair, got {len} element(s)")]
    MalformedFilterPair { column: String, len: usize },
    #[error("column `{column}`: `{target}` does not name a stored field of `{schema}`")]
    UnknownLookupTarget {
        column: String,
        target: String,
        schema: String,
    },
    #[error("search lookup `{target}` does not name a stored field of `{schema}`")]
    UnknownSearchTarget { target: String, schema: String },
    #[error("invalid lookup: {0}")]
    InvalidLookup(String),
    #[error("column `{0}` is neither a field of the data source nor has a value resolver")]
    UnknownColumn(String),
    #[error("`{setting}` names `{column}`, which is not a column of the catalog")]
    UndeclaredColumn {
        setting: &'static str,
        column: String,
    },
    #[error("column `{0}` is declared more than once")]
    DuplicateColumn(String),
    #[error("results_per_page must be greater than zero")]
    ZeroPageSize,
    #[error("invalid catalog configuration: {0}")]
    Invalid(String),
}

/// A malformed query string. Surfaced to clients as a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientParameterError {
    #[error("`page` must be a non-negative integer, got `{0}`")]
    InvalidPage(String),
    #[error("`orderings` must be comma-separated integers in -1, 0, 1, got `{0}`")]
    InvalidOrdering(String),
    #[error("`page` {page} is out of range")]
    PageOutOfRange { page: u64 },
}
