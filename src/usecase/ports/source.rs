use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::entities::catalog::FilterChoice;
use crate::domain::entities::query::{ComposedQuery, Slice};
use crate::domain::entities::schema::Schema;
use crate::domain::entities::value::CellValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    Message(String),
    Unsupported(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Message(message) => write!(f, "{message}"),
            SourceError::Unsupported(what) => write!(f, "unsupported by data source: {what}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Zero-argument accessor producing a value on demand.
pub type Accessor = Arc<dyn Fn() -> CellValue + Send + Sync>;

#[derive(Clone)]
pub enum Attribute {
    Value(CellValue),
    Accessor(Accessor),
}

impl Attribute {
    /// The final value, invoking the accessor if there is one.
    pub fn resolve(&self) -> CellValue {
        match self {
            Attribute::Value(value) => value.clone(),
            Attribute::Accessor(accessor) => accessor(),
        }
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Attribute::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

/// One record returned by a data source.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub id: i64,
    pub attributes: HashMap<String, Attribute>,
    pub displays: HashMap<String, CellValue>,
}

impl Row {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.attributes
            .insert(name.into(), Attribute::Value(value.into()));
        self
    }

    pub fn with_accessor<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn() -> CellValue + Send + Sync + 'static,
    {
        self.attributes
            .insert(name.into(), Attribute::Accessor(Arc::new(accessor)));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Human-readable variant of a coded value, if the source provides one.
    pub fn display(&self, name: &str) -> Option<&CellValue> {
        self.displays.get(name)
    }
}

/// The tabular backend the engine composes queries against.
///
/// Implementations are read-only from the engine's point of view and must be
/// safe to share across request threads.
pub trait DataSource: Send + Sync {
    fn schema(&self) -> &Schema;

    fn supports_full_text_search(&self) -> bool {
        false
    }

    /// Per-language full-text configuration for a primary language subtag.
    fn full_text_config_for(&self, _language: &str) -> Option<String> {
        None
    }

    /// Number of records matching the query's predicates, ignoring slicing.
    fn count(&self, query: &ComposedQuery) -> Result<u64, SourceError>;

    fn fetch(&self, query: &ComposedQuery, slice: Slice) -> Result<Vec<Row>, SourceError>;

    /// Distinct non-null values of a stored field, in ascending order.
    fn distinct_values(&self, field: &str) -> Result<Vec<FilterChoice>, SourceError>;
}

impl<S: DataSource + ?Sized> DataSource for Arc<S> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn supports_full_text_search(&self) -> bool {
        (**self).supports_full_text_search()
    }

    fn full_text_config_for(&self, language: &str) -> Option<String> {
        (**self).full_text_config_for(language)
    }

    fn count(&self, query: &ComposedQuery) -> Result<u64, SourceError> {
        (**self).count(query)
    }

    fn fetch(&self, query: &ComposedQuery, slice: Slice) -> Result<Vec<Row>, SourceError> {
        (**self).fetch(query, slice)
    }

    fn distinct_values(&self, field: &str) -> Result<Vec<FilterChoice>, SourceError> {
        (**self).distinct_values(field)
    }
}
