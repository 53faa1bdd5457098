use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::domain::entities::catalog::FilterChoice;
use crate::domain::entities::ordering::OrderToken;
use crate::domain::entities::query::{ComposedQuery, Predicate, Slice};
use crate::domain::entities::schema::Schema;
use crate::domain::entities::value::CellValue;
use crate::usecase::ports::source::{DataSource, Row, SourceError};

/// Language subtag → text search configuration.
pub const DEFAULT_SEARCH_CONFIGS: &[(&str, &str)] = &[
    ("da", "danish"),
    ("nl", "dutch"),
    ("en", "english"),
    ("fi", "finnish"),
    ("fr", "french"),
    ("de", "german"),
    ("hu", "hungarian"),
    ("it", "italian"),
    ("nb", "norwegian"),
    ("nn", "norwegian"),
    ("pt", "portuguese"),
    ("ro", "romanian"),
    ("ru", "russian"),
    ("es", "spanish"),
    ("sv", "swedish"),
    ("tr", "turkish"),
];

/// Rows held in memory, in insertion order.
///
/// Full-text search, when enabled, matches when every query word is a
/// case-insensitive prefix of some word of the concatenated targets.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    schema: Schema,
    rows: Vec<Row>,
    full_text: bool,
    search_configs: HashMap<String, String>,
}

impl MemorySource {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Row>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Advertises full-text search with the default language map.
    pub fn with_full_text_search(mut self) -> Self {
        self.full_text = true;
        self.search_configs.extend(
            DEFAULT_SEARCH_CONFIGS
                .iter()
                .map(|(language, config)| (language.to_string(), config.to_string())),
        );
        self
    }

    fn value(&self, row: &Row, field: &str) -> Result<CellValue, SourceError> {
        if self.schema.stored_field(field).is_none() {
            return Err(SourceError::Message(format!(
                "`{field}` is not a stored field of `{}`",
                self.schema.name
            )));
        }
        Ok(row
            .attribute(field)
            .map(|attribute| attribute.resolve())
            .unwrap_or(CellValue::Null))
    }

    fn matches(&self, row: &Row, predicate: &Predicate) -> Result<bool, SourceError> {
        match predicate {
            Predicate::Lookup { lookup, value } => {
                Ok(lookup.matches(&self.value(row, &lookup.field)?, value))
            }
            Predicate::Any(predicates) => {
                for predicate in predicates {
                    if self.matches(row, predicate)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::FullText { targets, query, .. } => {
                if !self.full_text {
                    return Err(SourceError::Unsupported("full-text search".to_string()));
                }
                let mut words = Vec::new();
                for target in targets {
                    let text = self.value(row, target)?.to_cell_text().to_lowercase();
                    words.extend(
                        text.split(|c: char| !c.is_alphanumeric())
                            .filter(|word| !word.is_empty())
                            .map(str::to_string),
                    );
                }
                Ok(query
                    .to_lowercase()
                    .split_whitespace()
                    .all(|term| words.iter().any(|word| word.starts_with(term))))
            }
        }
    }

    fn compare(
        &self,
        left: &Row,
        right: &Row,
        ordering: &[OrderToken],
    ) -> Result<Ordering, SourceError> {
        for token in ordering {
            let by_field = self
                .value(left, &token.field)?
                .sort_cmp(&self.value(right, &token.field)?);
            let by_field = if token.descending {
                by_field.reverse()
            } else {
                by_field
            };
            if by_field != Ordering::Equal {
                return Ok(by_field);
            }
        }
        Ok(Ordering::Equal)
    }

    fn select(&self, query: &ComposedQuery) -> Result<Vec<&Row>, SourceError> {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for row in &self.rows {
            if query.distinct && !seen.insert(row.id) {
                continue;
            }
            let mut keep = true;
            for predicate in &query.predicates {
                if !self.matches(row, predicate)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                selected.push(row);
            }
        }
        Ok(selected)
    }

    fn with_displays(&self, row: &Row) -> Row {
        let mut row = row.clone();
        for field in self.schema.fields.iter().filter(|field| field.has_display_variant()) {
            if row.displays.contains_key(&field.name) {
                continue;
            }
            let raw = row
                .attribute(&field.name)
                .map(|attribute| attribute.resolve().to_cell_text())
                .unwrap_or_default();
            if let Some(label) = field.choice_label(&raw) {
                row.displays
                    .insert(field.name.clone(), CellValue::from(label));
            }
        }
        row
    }
}

impl DataSource for MemorySource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn supports_full_text_search(&self) -> bool {
        self.full_text
    }

    fn full_text_config_for(&self, language: &str) -> Option<String> {
        self.search_configs.get(language).cloned()
    }

    fn count(&self, query: &ComposedQuery) -> Result<u64, SourceError> {
        Ok(self.select(query)?.len() as u64)
    }

    fn fetch(&self, query: &ComposedQuery, slice: Slice) -> Result<Vec<Row>, SourceError> {
        let mut selected = self.select(query)?;
        if !query.ordering.is_empty() {
            // Validate every token up front so the comparator cannot fail.
            if let Some(first) = selected.first() {
                self.compare(first, first, &query.ordering)?;
            }
            selected.sort_by(|left, right| {
                self.compare(left, right, &query.ordering)
                    .unwrap_or(Ordering::Equal)
            });
        }
        let offset = usize::try_from(slice.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(slice.limit).unwrap_or(usize::MAX);
        Ok(selected
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| self.with_displays(row))
            .collect())
    }

    fn distinct_values(&self, field: &str) -> Result<Vec<FilterChoice>, SourceError> {
        let schema_field = self.schema.stored_field(field).ok_or_else(|| {
            SourceError::Message(format!(
                "`{field}` is not a stored field of `{}`",
                self.schema.name
            ))
        })?;
        let mut values = Vec::new();
        for row in &self.rows {
            let value = self.value(row, field)?;
            if !value.is_null() && !values.contains(&value) {
                values.push(value);
            }
        }
        values.sort_by(CellValue::sort_cmp);
        Ok(values
            .into_iter()
            .map(|value| {
                let raw = value.to_cell_text();
                let label = schema_field
                    .choice_label(&raw)
                    .map(str::to_string)
                    .unwrap_or_else(|| raw.clone());
                FilterChoice::new(raw, label)
            })
            .collect())
    }
}
