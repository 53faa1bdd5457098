#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A stored, queryable field.
    Stored,
    /// A value computed per record; it can be displayed but not filtered or sorted.
    Computed { short_description: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub verbose_name: String,
    pub kind: FieldKind,
    /// Stored value → label pairs. Non-empty means the field has a display variant.
    pub choices: Vec<(String, String)>,
}

impl SchemaField {
    pub fn stored(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            verbose_name: default_verbose_name(&name),
            name,
            kind: FieldKind::Stored,
            choices: Vec::new(),
        }
    }

    pub fn computed(name: impl Into<String>, short_description: Option<&str>) -> Self {
        let name = name.into();
        Self {
            verbose_name: default_verbose_name(&name),
            name,
            kind: FieldKind::Computed {
                short_description: short_description.map(str::to_string),
            },
            choices: Vec::new(),
        }
    }

    pub fn with_verbose_name(mut self, verbose_name: impl Into<String>) -> Self {
        self.verbose_name = verbose_name.into();
        self
    }

    pub fn with_choices<I, V, L>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        self.choices = choices
            .into_iter()
            .map(|(value, label)| (value.into(), label.into()))
            .collect();
        self
    }

    pub fn is_stored(&self) -> bool {
        matches!(self.kind, FieldKind::Stored)
    }

    pub fn has_display_variant(&self) -> bool {
        !self.choices.is_empty()
    }

    pub fn choice_label(&self, raw: &str) -> Option<&str> {
        self.choices
            .iter()
            .find(|(value, _)| value == raw)
            .map(|(_, label)| label.as_str())
    }
}

/// Fields a data source exposes, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub name: String,
    pub verbose_name_plural: String,
    pub fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        let name = name.into();
        Self {
            verbose_name_plural: default_verbose_name(&name),
            name,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn stored_field(&self, name: &str) -> Option<&SchemaField> {
        self.field(name).filter(|field| field.is_stored())
    }

    pub fn stored_field_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|field| field.is_stored())
            .map(|field| field.name.clone())
            .collect()
    }
}

pub fn default_verbose_name(name: &str) -> String {
    name.replace('_', " ")
}

/// Uppercases the first character, leaving the rest untouched.
pub fn capfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capfirst_only_touches_first_character() {
        assert_eq!(capfirst("first name"), "First name");
        assert_eq!(capfirst("éclair"), "Éclair");
        assert_eq!(capfirst(""), "");
    }

    #[test]
    fn stored_field_names_skip_computed_fields() {
        let schema = Schema::new(
            "person",
            vec![
                SchemaField::stored("name"),
                SchemaField::computed("initials", Some("initials")),
                SchemaField::stored("age"),
            ],
        );
        assert_eq!(schema.stored_field_names(), vec!["name", "age"]);
        assert!(schema.stored_field("initials").is_none());
        assert!(schema.field("initials").is_some());
    }
}
