use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::domain::entities::lookup::Lookup;
use crate::domain::entities::ordering::{Direction, OrderToken};
use crate::domain::entities::query::{ComposedQuery, Predicate};
use crate::domain::entities::schema::{capfirst, FieldKind, Schema};
use crate::domain::entities::value::CellValue;
use crate::domain::error::ConfigurationError;
use crate::usecase::ports::source::Row;

pub const DEFAULT_WIDTH: &str = "initial";
pub const DEFAULT_RESULTS_PER_PAGE: u64 = 15;

/// Custom filter: receives the query so far and the raw choice value.
pub type FilterFn = Arc<dyn Fn(ComposedQuery, &str) -> ComposedQuery + Send + Sync>;
/// Custom cell value resolver.
pub type ResolverFn = Arc<dyn Fn(&Row) -> CellValue + Send + Sync>;

/// A filter value offered to the client, serialized as `[value, label]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChoice {
    pub value: String,
    pub label: String,
}

impl FilterChoice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl Serialize for FilterChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.value, &self.label).serialize(serializer)
    }
}

/// Filter values as declared, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValues {
    Pairs(Vec<Vec<String>>),
    /// Distinct values of a stored field, read from the data source on demand.
    Distinct(String),
}

impl FilterValues {
    pub fn pairs<I, P, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValues::Pairs(
            pairs
                .into_iter()
                .map(|pair| pair.into_iter().map(Into::into).collect())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterSource {
    Empty,
    Static(Vec<FilterChoice>),
    Distinct(String),
}

#[derive(Clone)]
pub enum ColumnFilter {
    /// `column == choice` against the stored field of the same name.
    Equality(Lookup),
    Custom(FilterFn),
    /// The column has no stored field and no custom filter; choices are ignored.
    Unavailable,
}

impl fmt::Debug for ColumnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnFilter::Equality(lookup) => f.debug_tuple("Equality").field(lookup).finish(),
            ColumnFilter::Custom(_) => f.write_str("Custom(..)"),
            ColumnFilter::Unavailable => f.write_str("Unavailable"),
        }
    }
}

/// How a column's cell text is obtained from a record.
#[derive(Clone)]
pub enum ValueResolver {
    RawField,
    DisplayVariant,
    Custom(ResolverFn),
}

impl fmt::Debug for ValueResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueResolver::RawField => f.write_str("RawField"),
            ValueResolver::DisplayVariant => f.write_str("DisplayVariant"),
            ValueResolver::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    label: String,
    width: String,
    ordering: Vec<OrderToken>,
    filter_source: FilterSource,
    filter: ColumnFilter,
    resolver: ValueResolver,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn verbose_label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> &str {
        &self.width
    }

    pub fn filter(&self) -> &ColumnFilter {
        &self.filter
    }

    pub fn resolver(&self) -> &ValueResolver {
        &self.resolver
    }

    /// Sort tokens for this column in the given direction; empty when the
    /// direction is `Unordered` or the column cannot be sorted.
    pub fn ordering_for(&self, direction: Direction) -> Vec<OrderToken> {
        match direction {
            Direction::Unordered => Vec::new(),
            Direction::Ascending => self.ordering.clone(),
            Direction::Descending => self.ordering.iter().map(OrderToken::flipped).collect(),
        }
    }

    pub fn is_orderable(&self) -> bool {
        !self.ordering.is_empty()
    }

    /// Declared filter pairs; a lazy source is materialized through `load`.
    pub fn filter_values<E>(
        &self,
        load: impl FnOnce(&str) -> Result<Vec<FilterChoice>, E>,
    ) -> Result<Vec<FilterChoice>, E> {
        match &self.filter_source {
            FilterSource::Empty => Ok(Vec::new()),
            FilterSource::Static(choices) => Ok(choices.clone()),
            FilterSource::Distinct(field) => load(field),
        }
    }
}

/// Process-wide, read-only description of a table's columns.
#[derive(Debug, Clone)]
pub struct ColumnCatalog {
    columns: Vec<Column>,
    search_lookups: Vec<Lookup>,
    results_per_page: u64,
    access_control_allow_origin: Option<String>,
    verbose_name_plural: String,
    ajax_url: String,
}

impl ColumnCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn search_lookups(&self) -> &[Lookup] {
        &self.search_lookups
    }

    pub fn search_enabled(&self) -> bool {
        !self.search_lookups.is_empty()
    }

    pub fn results_per_page(&self) -> u64 {
        self.results_per_page
    }

    pub fn access_control_allow_origin(&self) -> Option<&str> {
        self.access_control_allow_origin.as_deref()
    }

    pub fn verbose_name_plural(&self) -> &str {
        &self.verbose_name_plural
    }

    pub fn ajax_url(&self) -> &str {
        &self.ajax_url
    }
}

pub struct CatalogBuilder {
    columns: Vec<String>,
    verbose_columns: HashMap<String, String>,
    columns_widths: HashMap<String, String>,
    search_lookups: Vec<String>,
    orderings: HashMap<String, Vec<String>>,
    filters: HashMap<String, FilterValues>,
    filter_methods: HashMap<String, FilterFn>,
    filter_lookups: HashMap<String, String>,
    resolvers: HashMap<String, ResolverFn>,
    results_per_page: u64,
    access_control_allow_origin: Option<String>,
    verbose_name_plural: Option<String>,
    ajax_url: String,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            verbose_columns: HashMap::new(),
            columns_widths: HashMap::new(),
            search_lookups: Vec::new(),
            orderings: HashMap::new(),
            filters: HashMap::new(),
            filter_methods: HashMap::new(),
            filter_lookups: HashMap::new(),
            resolvers: HashMap::new(),
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            access_control_allow_origin: None,
            verbose_name_plural: None,
            ajax_url: String::new(),
        }
    }
}

impl CatalogBuilder {
    /// Declared columns. When none are declared, every stored field of the
    /// schema is used in schema order.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn verbose_column(mut self, column: impl Into<String>, label: impl Into<String>) -> Self {
        self.verbose_columns.insert(column.into(), label.into());
        self
    }

    pub fn width(mut self, column: impl Into<String>, width: impl Into<String>) -> Self {
        self.columns_widths.insert(column.into(), width.into());
        self
    }

    pub fn search_lookups<I, S>(mut self, lookups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_lookups = lookups.into_iter().map(Into::into).collect();
        self
    }

    /// Ordering override: tokens such as `last_name` or `-created`.
    pub fn ordering<I, S>(mut self, column: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.orderings
            .insert(column.into(), tokens.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter_values(mut self, column: impl Into<String>, values: FilterValues) -> Self {
        self.filters.insert(column.into(), values);
        self
    }

    pub fn filter_method<F>(mut self, column: impl Into<String>, method: F) -> Self
    where
        F: Fn(ComposedQuery, &str) -> ComposedQuery + Send + Sync + 'static,
    {
        self.filter_methods.insert(column.into(), Arc::new(method));
        self
    }

    /// Declarative custom filter: applies `lookup` with the choice value.
    pub fn filter_lookup(mut self, column: impl Into<String>, lookup: impl Into<String>) -> Self {
        self.filter_lookups.insert(column.into(), lookup.into());
        self
    }

    pub fn value_resolver<F>(mut self, column: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&Row) -> CellValue + Send + Sync + 'static,
    {
        self.resolvers.insert(column.into(), Arc::new(resolver));
        self
    }

    pub fn results_per_page(mut self, results_per_page: u64) -> Self {
        self.results_per_page = results_per_page;
        self
    }

    pub fn access_control_allow_origin(mut self, origin: impl Into<String>) -> Self {
        let origin = origin.into();
        self.access_control_allow_origin = (!origin.is_empty()).then_some(origin);
        self
    }

    pub fn verbose_name_plural(mut self, name: impl Into<String>) -> Self {
        self.verbose_name_plural = Some(name.into());
        self
    }

    pub fn ajax_url(mut self, url: impl Into<String>) -> Self {
        self.ajax_url = url.into();
        self
    }

    /// Validates every declaration against `schema` and freezes the catalog.
    pub fn build(mut self, schema: &Schema) -> Result<ColumnCatalog, ConfigurationError> {
        if self.results_per_page == 0 {
            return Err(ConfigurationError::ZeroPageSize);
        }

        let names = if self.columns.is_empty() {
            schema.stored_field_names()
        } else {
            std::mem::take(&mut self.columns)
        };

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.clone()) {
                return Err(ConfigurationError::DuplicateColumn(name));
            }
            columns.push(self.build_column(name, schema)?);
        }
        if let Some((setting, column)) = self.undeclared_setting() {
            return Err(ConfigurationError::UndeclaredColumn { setting, column });
        }

        let search_lookups = self
            .search_lookups
            .iter()
            .map(|token| {
                let lookup: Lookup = token.parse().map_err(ConfigurationError::InvalidLookup)?;
                if schema.stored_field(&lookup.field).is_none() {
                    return Err(ConfigurationError::UnknownSearchTarget {
                        target: token.clone(),
                        schema: schema.name.clone(),
                    });
                }
                Ok(lookup)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ColumnCatalog {
            columns,
            search_lookups,
            results_per_page: self.results_per_page,
            access_control_allow_origin: self.access_control_allow_origin,
            verbose_name_plural: self
                .verbose_name_plural
                .unwrap_or_else(|| capfirst(&schema.verbose_name_plural)),
            ajax_url: self.ajax_url,
        })
    }

    /// A per-column setting that no declared column consumed.
    fn undeclared_setting(&self) -> Option<(&'static str, String)> {
        [
            ("verbose_columns", self.verbose_columns.keys().min()),
            ("columns_widths", self.columns_widths.keys().min()),
            ("orderings", self.orderings.keys().min()),
            ("filters", self.filters.keys().min()),
            ("filter_methods", self.filter_methods.keys().min()),
            ("filter_lookups", self.filter_lookups.keys().min()),
            ("value_resolvers", self.resolvers.keys().min()),
        ]
        .into_iter()
        .find_map(|(setting, column)| column.map(|column| (setting, column.clone())))
    }

    fn build_column(&mut self, name: String, schema: &Schema) -> Result<Column, ConfigurationError> {
        let field = schema.field(&name);
        let custom_resolver = self.resolvers.remove(&name);
        if field.is_none() && custom_resolver.is_none() {
            return Err(ConfigurationError::UnknownColumn(name));
        }
        let unknown_target = |target: &str| ConfigurationError::UnknownLookupTarget {
            column: name.clone(),
            target: target.to_string(),
            schema: schema.name.clone(),
        };

        let label = match (self.verbose_columns.remove(&name), field) {
            (Some(label), _) => label,
            (None, Some(field)) => match &field.kind {
                FieldKind::Stored => capfirst(&field.verbose_name),
                FieldKind::Computed {
                    short_description: Some(description),
                } => capfirst(description),
                FieldKind::Computed {
                    short_description: None,
                } => capfirst(&name),
            },
            (None, None) => capfirst(&name),
        };

        let width = self
            .columns_widths
            .remove(&name)
            .unwrap_or_else(|| DEFAULT_WIDTH.to_string());

        let ordering = match self.orderings.remove(&name) {
            Some(tokens) if tokens.is_empty() => {
                return Err(ConfigurationError::Invalid(format!(
                    "column `{name}`: ordering override must not be empty"
                )));
            }
            Some(tokens) => tokens
                .iter()
                .map(|token| {
                    let token = OrderToken::parse(token);
                    match schema.stored_field(&token.field) {
                        Some(_) => Ok(token),
                        None => Err(unknown_target(&token.field)),
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
            None if schema.stored_field(&name).is_some() => vec![OrderToken::asc(name.clone())],
            None => Vec::new(),
        };

        let filter = match (
            self.filter_methods.remove(&name),
            self.filter_lookups.remove(&name),
        ) {
            (Some(_), Some(_)) => {
                return Err(ConfigurationError::Invalid(format!(
                    "column `{name}`: declare a filter method or a filter lookup, not both"
                )));
            }
            (Some(method), None) => ColumnFilter::Custom(method),
            (None, Some(token)) => {
                let lookup: Lookup = token.parse().map_err(ConfigurationError::InvalidLookup)?;
                if schema.stored_field(&lookup.field).is_none() {
                    return Err(unknown_target(&token));
                }
                ColumnFilter::Custom(Arc::new(move |query: ComposedQuery, choice: &str| {
                    query.filter(Predicate::lookup(lookup.clone(), choice))
                }))
            }
            (None, None) if schema.stored_field(&name).is_some() => {
                ColumnFilter::Equality(Lookup::exact(name.clone()))
            }
            (None, None) => ColumnFilter::Unavailable,
        };

        let filter_source = match self.filters.remove(&name) {
            None => FilterSource::Empty,
            Some(FilterValues::Pairs(pairs)) if pairs.is_empty() => FilterSource::Empty,
            Some(FilterValues::Pairs(pairs)) => {
                let choices = pairs
                    .into_iter()
                    .map(|pair| match <[String; 2]>::try_from(pair) {
                        Ok([value, label]) => Ok(FilterChoice { value, label }),
                        Err(pair) => Err(ConfigurationError::MalformedFilterPair {
                            column: name.clone(),
                            len: pair.len(),
                        }),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                FilterSource::Static(choices)
            }
            Some(FilterValues::Distinct(source_field)) => {
                if schema.stored_field(&source_field).is_none() {
                    return Err(unknown_target(&source_field));
                }
                FilterSource::Distinct(source_field)
            }
        };
        if filter_source != FilterSource::Empty && matches!(filter, ColumnFilter::Unavailable) {
            return Err(unknown_target(&name));
        }

        let resolver = match (custom_resolver, field) {
            (Some(resolver), _) => ValueResolver::Custom(resolver),
            (None, Some(field)) if field.has_display_variant() => ValueResolver::DisplayVariant,
            (None, _) => ValueResolver::RawField,
        };

        Ok(Column {
            name,
            label,
            width,
            ordering,
            filter_source,
            filter,
            resolver,
        })
    }
}
