use url::form_urlencoded;

use crate::domain::entities::ordering::Direction;
use crate::domain::error::ClientParameterError;

pub const QUERY_PARAM: &str = "q";
pub const CHOICES_PARAM: &str = "choices";
pub const ORDERINGS_PARAM: &str = "orderings";
pub const PAGE_PARAM: &str = "page";
pub const CONFIG_FLAG: &str = "get_config";

/// Validated query-string parameters of one table request.
///
/// `choices` and `directions` are positional: element `i` belongs to catalog
/// column `i`. Extra elements are ignored; missing ones mean "no filter" and
/// "unordered".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestParameters {
    pub query: String,
    pub choices: Vec<String>,
    pub directions: Vec<Direction>,
    pub page: u64,
    pub wants_config: bool,
}

impl RequestParameters {
    /// Parses a raw query string (without the leading `?`).
    ///
    /// The client percent-encodes `q` and each choice before building the
    /// query string, so both are decoded a second time after the form
    /// decoding; choices are split on `,` before that second pass.
    pub fn parse(raw: &str, column_count: usize) -> Result<Self, ClientParameterError> {
        let mut query = None;
        let mut choices = None;
        let mut orderings = None;
        let mut page = None;
        let mut wants_config = false;

        for (key, value) in form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()) {
            // First occurrence wins for repeated keys.
            match &*key {
                QUERY_PARAM if query.is_none() => query = Some(value.into_owned()),
                CHOICES_PARAM if choices.is_none() => choices = Some(value.into_owned()),
                ORDERINGS_PARAM if orderings.is_none() => orderings = Some(value.into_owned()),
                PAGE_PARAM if page.is_none() => page = Some(value.into_owned()),
                CONFIG_FLAG => wants_config = true,
                _ => {}
            }
        }

        let query = match query {
            Some(query) => decode(&query).trim().to_string(),
            None => String::new(),
        };

        let choices = choices
            .unwrap_or_default()
            .split(',')
            .map(decode)
            .collect();

        let directions = match orderings {
            Some(orderings) => parse_directions(&orderings)?,
            None => vec![Direction::Unordered; column_count],
        };

        let page = match page {
            Some(page) => parse_page(&page)?,
            None => 0,
        };

        Ok(Self {
            query,
            choices,
            directions,
            page,
            wants_config,
        })
    }

    /// Choice for column `index`, or `None` when absent or empty.
    pub fn choice_for(&self, index: usize) -> Option<&str> {
        self.choices
            .get(index)
            .map(String::as_str)
            .filter(|choice| !choice.is_empty())
    }

    pub fn direction_for(&self, index: usize) -> Direction {
        self.directions.get(index).copied().unwrap_or_default()
    }
}

/// Lossy: invalid UTF-8 after decoding becomes U+FFFD instead of an error.
fn decode(value: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(value.as_bytes())).into_owned()
}

fn parse_directions(raw: &str) -> Result<Vec<Direction>, ClientParameterError> {
    raw.split(',')
        .map(|token| {
            token
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|value| Direction::try_from(value).ok())
                .ok_or_else(|| ClientParameterError::InvalidOrdering(raw.to_string()))
        })
        .collect()
}

fn parse_page(raw: &str) -> Result<u64, ClientParameterError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ClientParameterError::InvalidPage(raw.to_string()))
}
