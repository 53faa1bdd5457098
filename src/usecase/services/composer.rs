use tracing::debug;

use crate::domain::entities::catalog::{ColumnCatalog, ColumnFilter};
use crate::domain::entities::ordering::OrderToken;
use crate::domain::entities::params::RequestParameters;
use crate::domain::entities::query::{ComposedQuery, Predicate};
use crate::usecase::ports::source::DataSource;

/// How the free-text query is matched, negotiated with the data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStrategy {
    FullText { config: Option<String> },
    Substring,
}

impl SearchStrategy {
    pub fn negotiate<S: DataSource + ?Sized>(source: &S, locale: &str) -> Self {
        if source.supports_full_text_search() {
            SearchStrategy::FullText {
                config: source.full_text_config_for(&primary_language(locale)),
            }
        } else {
            SearchStrategy::Substring
        }
    }
}

/// `"pt-BR"` → `"pt"`.
pub fn primary_language(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub struct QueryComposer<'a> {
    catalog: &'a ColumnCatalog,
}

impl<'a> QueryComposer<'a> {
    pub fn new(catalog: &'a ColumnCatalog) -> Self {
        Self { catalog }
    }

    /// Search, filter, order and deduplicate; nothing is executed.
    pub fn compose<S: DataSource + ?Sized>(
        &self,
        source: &S,
        params: &RequestParameters,
        locale: &str,
    ) -> ComposedQuery {
        let strategy = SearchStrategy::negotiate(source, locale);
        let query = self.search(ComposedQuery::all(), &params.query, &strategy);
        let query = self.filter(query, params);
        let ordering = self.ordering(params);
        let query = if ordering.is_empty() {
            query
        } else {
            query.order_by(ordering)
        };
        query.distinct()
    }

    pub fn search(
        &self,
        query: ComposedQuery,
        text: &str,
        strategy: &SearchStrategy,
    ) -> ComposedQuery {
        if text.is_empty() || !self.catalog.search_enabled() {
            return query;
        }
        let predicate = match strategy {
            SearchStrategy::FullText { config } => Predicate::FullText {
                targets: self
                    .catalog
                    .search_lookups()
                    .iter()
                    .map(|lookup| lookup.field.clone())
                    .collect(),
                query: text.to_string(),
                config: config.clone(),
            },
            SearchStrategy::Substring => Predicate::Any(
                self.catalog
                    .search_lookups()
                    .iter()
                    .map(|lookup| Predicate::lookup(lookup.clone(), text))
                    .collect(),
            ),
        };
        debug!(?strategy, text, "search step");
        query.filter(predicate)
    }

    pub fn filter(&self, query: ComposedQuery, params: &RequestParameters) -> ComposedQuery {
        self.catalog
            .columns()
            .iter()
            .enumerate()
            .fold(query, |query, (index, column)| {
                let Some(choice) = params.choice_for(index) else {
                    return query;
                };
                debug!(column = column.name(), choice, "filter step");
                match column.filter() {
                    ColumnFilter::Custom(method) => method(query, choice),
                    ColumnFilter::Equality(lookup) => {
                        query.filter(Predicate::lookup(lookup.clone(), choice))
                    }
                    ColumnFilter::Unavailable => {
                        debug!(column = column.name(), "column is not filterable, choice ignored");
                        query
                    }
                }
            })
    }

    /// Flat, column-ordered list of sort keys for the requested directions.
    pub fn ordering(&self, params: &RequestParameters) -> Vec<OrderToken> {
        self.catalog
            .columns()
            .iter()
            .enumerate()
            .flat_map(|(index, column)| column.ordering_for(params.direction_for(index)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::lookup::Lookup;
    use crate::domain::entities::ordering::Direction;
    use crate::domain::entities::schema::{Schema, SchemaField};
    use crate::infra::memory::source::MemorySource;

    fn people() -> MemorySource {
        MemorySource::new(Schema::new(
            "person",
            vec![
                SchemaField::stored("name"),
                SchemaField::stored("age"),
                SchemaField::stored("city"),
            ],
        ))
    }

    fn catalog(source: &MemorySource) -> ColumnCatalog {
        ColumnCatalog::builder()
            .columns(["name", "age"])
            .search_lookups(["name__icontains", "city"])
            .build(source.schema())
            .expect("catalog should build")
    }

    fn params(raw: &str) -> RequestParameters {
        RequestParameters::parse(raw, 2).expect("valid parameters")
    }

    #[test]
    fn scenario_query_composes_search_filter_and_ordering() {
        let source = people();
        let catalog = catalog(&source);
        let query = QueryComposer::new(&catalog).compose(
            &source,
            &params("q=Jane&choices=,30&orderings=1,0&page=0"),
            "en",
        );

        assert_eq!(
            query.predicates,
            vec![
                Predicate::Any(vec![
                    Predicate::lookup("name__icontains".parse().expect("lookup"), "Jane"),
                    Predicate::lookup(Lookup::exact("city"), "Jane"),
                ]),
                Predicate::lookup(Lookup::exact("age"), "30"),
            ]
        );
        assert_eq!(query.ordering, vec![OrderToken::asc("name")]);
        assert!(query.distinct);
    }

    #[test]
    fn empty_query_leaves_search_untouched() {
        let source = people();
        let catalog = catalog(&source);
        let composer = QueryComposer::new(&catalog);
        let with_empty = composer.compose(&source, &params("q=%20%20"), "en");
        let without = composer.compose(&source, &params(""), "en");
        assert_eq!(with_empty, without);
        assert!(with_empty.predicates.is_empty());
    }

    #[test]
    fn search_without_targets_is_a_no_op() {
        let source = people();
        let catalog = ColumnCatalog::builder()
            .build(source.schema())
            .expect("catalog should build");
        let query = QueryComposer::new(&catalog).compose(&source, &params("q=Jane"), "en");
        assert!(query.predicates.is_empty());
    }

    #[test]
    fn full_text_is_chosen_when_the_source_supports_it() {
        let source = people().with_full_text_search();
        let catalog = catalog(&source);
        let query = QueryComposer::new(&catalog).compose(&source, &params("q=Jane"), "fr-CA");
        assert_eq!(
            query.predicates,
            vec![Predicate::FullText {
                targets: vec!["name".to_string(), "city".to_string()],
                query: "Jane".to_string(),
                config: Some("french".to_string()),
            }]
        );
    }

    #[test]
    fn unmapped_locale_falls_back_to_no_config() {
        let source = people().with_full_text_search();
        assert_eq!(
            SearchStrategy::negotiate(&source, "ja"),
            SearchStrategy::FullText { config: None }
        );
        assert_eq!(SearchStrategy::negotiate(&people(), "en"), SearchStrategy::Substring);
    }

    #[test]
    fn custom_filter_method_replaces_equality() {
        let source = people();
        let catalog = ColumnCatalog::builder()
            .columns(["name", "age"])
            .filter_method("age", |query, choice| {
                query.filter(Predicate::lookup(
                    "age__startswith".parse().expect("lookup"),
                    choice,
                ))
            })
            .build(source.schema())
            .expect("catalog should build");
        let query = QueryComposer::new(&catalog).compose(&source, &params("choices=,3"), "en");
        assert_eq!(
            query.predicates,
            vec![Predicate::lookup(
                "age__startswith".parse().expect("lookup"),
                "3"
            )]
        );
    }

    #[test]
    fn ordering_concatenates_columns_in_catalog_order() {
        let source = people();
        let catalog = ColumnCatalog::builder()
            .columns(["name", "age"])
            .ordering("name", ["city", "name"])
            .build(source.schema())
            .expect("catalog should build");
        let composer = QueryComposer::new(&catalog);

        let tokens = composer.ordering(&params("orderings=-1,1"));
        assert_eq!(
            tokens,
            vec![
                OrderToken::desc("city"),
                OrderToken::desc("name"),
                OrderToken::asc("age"),
            ]
        );

        let unordered = composer.compose(&source, &params("orderings=0,0"), "en");
        assert!(unordered.ordering.is_empty());
    }

    #[test]
    fn extra_positional_tokens_are_ignored() {
        let source = people();
        let catalog = catalog(&source);
        let composer = QueryComposer::new(&catalog);
        let parsed = params("choices=a,b,c,d&orderings=1,1,1,-1");
        assert_eq!(parsed.direction_for(3), Direction::Descending);
        let query = composer.compose(&source, &parsed, "en");
        assert_eq!(query.predicates.len(), 2);
        assert_eq!(query.ordering.len(), 2);
    }

    #[test]
    fn primary_language_drops_region() {
        assert_eq!(primary_language("pt-BR"), "pt");
        assert_eq!(primary_language("en_US"), "en");
        assert_eq!(primary_language(""), "");
    }
}
