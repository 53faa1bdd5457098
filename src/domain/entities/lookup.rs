use std::fmt;
use std::str::FromStr;

use crate::domain::entities::value::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupOp {
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
}

impl LookupOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LookupOp::Exact => "exact",
            LookupOp::IExact => "iexact",
            LookupOp::Contains => "contains",
            LookupOp::IContains => "icontains",
            LookupOp::StartsWith => "startswith",
            LookupOp::IStartsWith => "istartswith",
            LookupOp::EndsWith => "endswith",
            LookupOp::IEndsWith => "iendswith",
        }
    }

    pub fn is_case_insensitive(self) -> bool {
        matches!(
            self,
            LookupOp::IExact | LookupOp::IContains | LookupOp::IStartsWith | LookupOp::IEndsWith
        )
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        let op = match suffix {
            "exact" => LookupOp::Exact,
            "iexact" => LookupOp::IExact,
            "contains" => LookupOp::Contains,
            "icontains" => LookupOp::IContains,
            "startswith" => LookupOp::StartsWith,
            "istartswith" => LookupOp::IStartsWith,
            "endswith" => LookupOp::EndsWith,
            "iendswith" => LookupOp::IEndsWith,
            _ => return None,
        };
        Some(op)
    }
}

/// A named path into the data source: `field` or `field__op`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lookup {
    pub field: String,
    pub op: LookupOp,
}

impl Lookup {
    pub fn exact(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: LookupOp::Exact,
        }
    }

    /// Compares the textual form of `value` against `needle`.
    pub fn matches(&self, value: &CellValue, needle: &str) -> bool {
        if value.is_null() {
            return false;
        }
        let text = value.to_string();
        let (text, needle) = if self.op.is_case_insensitive() {
            (text.to_lowercase(), needle.to_lowercase())
        } else {
            (text, needle.to_string())
        };
        match self.op {
            LookupOp::Exact | LookupOp::IExact => text == needle,
            LookupOp::Contains | LookupOp::IContains => text.contains(&needle),
            LookupOp::StartsWith | LookupOp::IStartsWith => text.starts_with(&needle),
            LookupOp::EndsWith | LookupOp::IEndsWith => text.ends_with(&needle),
        }
    }
}

impl FromStr for Lookup {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (field, op) = match token.rsplit_once("__") {
            Some((field, suffix)) => match LookupOp::from_suffix(suffix) {
                Some(op) => (field, op),
                None => return Err(format!("unsupported lookup `{suffix}` in `{token}`")),
            },
            None => (token, LookupOp::Exact),
        };
        if field.is_empty() {
            return Err(format!("lookup `{token}` does not name a field"));
        }
        Ok(Self {
            field: field.to_string(),
            op,
        })
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            LookupOp::Exact => f.write_str(&self.field),
            op => write!(f, "{}__{}", self.field, op.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_field_is_exact_lookup() {
        let lookup: Lookup = "name".parse().expect("bare field parses");
        assert_eq!(lookup, Lookup::exact("name"));
    }

    #[test]
    fn suffix_selects_operator() {
        let lookup: Lookup = "first_name__icontains".parse().expect("lookup parses");
        assert_eq!(lookup.field, "first_name");
        assert_eq!(lookup.op, LookupOp::IContains);
        assert_eq!(lookup.to_string(), "first_name__icontains");
    }

    #[test]
    fn unknown_suffix_is_rejected() {
        assert!("name__regex".parse::<Lookup>().is_err());
        assert!("__exact".parse::<Lookup>().is_err());
    }

    #[test]
    fn matches_uses_text_form_and_case_rules() {
        let lookup: Lookup = "name__icontains".parse().expect("lookup parses");
        assert!(lookup.matches(&CellValue::from("Jane Doe"), "jane"));
        assert!(!lookup.matches(&CellValue::Null, "jane"));
        assert!(Lookup::exact("age").matches(&CellValue::Integer(30), "30"));
        assert!(!Lookup::exact("name").matches(&CellValue::from("Jane"), "jane"));
    }
}
