use std::fmt;

/// Per-column sort request. Encoded on the wire as `-1`, `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Descending,
    #[default]
    Unordered,
    Ascending,
}

impl TryFrom<i64> for Direction {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Direction::Descending),
            0 => Ok(Direction::Unordered),
            1 => Ok(Direction::Ascending),
            other => Err(other),
        }
    }
}

/// One sort key: a schema field plus its direction. Written `field` or `-field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderToken {
    pub field: String,
    pub descending: bool,
}

impl OrderToken {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    pub fn parse(token: &str) -> Self {
        match token.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(token),
        }
    }

    pub fn flipped(&self) -> Self {
        Self {
            field: self.field.clone(),
            descending: !self.descending,
        }
    }
}

impl fmt::Display for OrderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field)
        } else {
            f.write_str(&self.field)
        }
    }
}
