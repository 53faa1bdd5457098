use crate::domain::entities::lookup::Lookup;
use crate::domain::entities::ordering::OrderToken;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Lookup { lookup: Lookup, value: String },
    /// Logical OR. An empty `Any` matches nothing.
    Any(Vec<Predicate>),
    /// Full-text match of `query` against the concatenated `targets`.
    FullText {
        targets: Vec<String>,
        query: String,
        config: Option<String>,
    },
}

impl Predicate {
    pub fn lookup(lookup: Lookup, value: impl Into<String>) -> Self {
        Predicate::Lookup {
            lookup,
            value: value.into(),
        }
    }
}

/// Unexecuted description of search, filter, ordering and deduplication.
///
/// Predicates are ANDed in insertion order. Pagination is not part of the
/// query; it is applied by the materializer when fetching a page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComposedQuery {
    pub predicates: Vec<Predicate>,
    pub ordering: Vec<OrderToken>,
    pub distinct: bool,
}

impl ComposedQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Replaces any previous ordering.
    pub fn order_by(mut self, ordering: Vec<OrderToken>) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

/// Offset/limit window applied when fetching records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub offset: u64,
    pub limit: u64,
}
