use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::entities::catalog::{CatalogBuilder, FilterValues, DEFAULT_RESULTS_PER_PAGE};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OrderingConfig {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FilterConfig {
    Pairs(Vec<Vec<String>>),
    Distinct { distinct: String },
}

fn default_results_per_page() -> u64 {
    DEFAULT_RESULTS_PER_PAGE
}

/// Catalog declaration as read from a YAML file.
///
/// ```yaml
/// table: person
/// columns: [name, age]
/// search_lookups: [name__icontains]
/// orderings:
///   name: [last_name, first_name]
/// filters:
///   age: [["30", "Thirty"], ["40", "Forty"]]
///   status: { distinct: status }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    pub table: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub verbose_columns: BTreeMap<String, String>,
    #[serde(default)]
    pub columns_widths: BTreeMap<String, String>,
    #[serde(default)]
    pub search_lookups: Vec<String>,
    #[serde(default)]
    pub orderings: BTreeMap<String, OrderingConfig>,
    #[serde(default)]
    pub filters: BTreeMap<String, FilterConfig>,
    #[serde(default)]
    pub filter_lookups: BTreeMap<String, String>,
    #[serde(default = "default_results_per_page")]
    pub results_per_page: u64,
    #[serde(default)]
    pub access_control_allow_origin: String,
    pub verbose_name_plural: Option<String>,
    #[serde(default)]
    pub ajax_url: String,
}

impl CatalogConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("failed to parse catalog config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog config: {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Unvalidated builder; validation happens when it is built against a schema.
    pub fn into_builder(self) -> CatalogBuilder {
        let mut builder = CatalogBuilder::default()
            .columns(self.columns)
            .search_lookups(self.search_lookups)
            .results_per_page(self.results_per_page)
            .access_control_allow_origin(self.access_control_allow_origin)
            .ajax_url(self.ajax_url);
        if let Some(name) = self.verbose_name_plural {
            builder = builder.verbose_name_plural(name);
        }
        for (column, label) in self.verbose_columns {
            builder = builder.verbose_column(column, label);
        }
        for (column, width) in self.columns_widths {
            builder = builder.width(column, width);
        }
        for (column, ordering) in self.orderings {
            builder = match ordering {
                OrderingConfig::One(token) => builder.ordering(column, [token]),
                OrderingConfig::Many(tokens) => builder.ordering(column, tokens),
            };
        }
        for (column, filter) in self.filters {
            let values = match filter {
                FilterConfig::Pairs(pairs) => FilterValues::Pairs(pairs),
                FilterConfig::Distinct { distinct } => FilterValues::Distinct(distinct),
            };
            builder = builder.filter_values(column, values);
        }
        for (column, lookup) in self.filter_lookups {
            builder = builder.filter_lookup(column, lookup);
        }
        builder
    }
}
