//! Builds a `Searchable` from HTTP-style request parameters.
//!
//! The canonical form is a single `q` parameter holding query text. Older
//! clients send one parameter per attribute instead (`lastName=DOE`,
//! `age[ge]=20`); those are rewritten into canonical text and parsed, so both
//! paths go through the same validation.

use crate::errors::{Result, SearchError};
use crate::parser::{Parser, ParserConfig};
use crate::predicate::{is_name_char, Searchable};
use crate::serialize::{ESCAPE, QUOTE};
use log::{debug, warn};
use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_QUERY_PARAMETER: &str = "q";

/// Paging and sorting parameters, never treated as search fields
pub const DEFAULT_RESERVED: &[&str] = &["page", "size", "sort", "paged", "unpaged"];

static FIELD_WITH_CODE_REGEX: OnceLock<Regex> = OnceLock::new();

fn field_with_code_regex() -> &'static Regex {
    FIELD_WITH_CODE_REGEX.get_or_init(|| Regex::new(r"^([^\[\]]+)\[([^\[\]]*)\]$").unwrap())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Name of the canonical query parameter, before `prefix` is applied
    pub query_parameter: String,
    pub prefix: String,
    /// Parameter names skipped by the legacy fallback, compared case-insensitively
    pub reserved: Vec<String>,
    pub parser: ParserConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            query_parameter: DEFAULT_QUERY_PARAMETER.to_string(),
            prefix: String::new(),
            reserved: DEFAULT_RESERVED.iter().map(|s| s.to_string()).collect(),
            parser: ParserConfig::default(),
        }
    }
}

impl ResolverConfig {
    /// Adds caller-owned parameter names (e.g. other handler arguments) to the reserved set.
    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn query_parameter_name(&self) -> String {
        format!("{}{}", self.prefix, self.query_parameter)
    }

    fn is_reserved(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.query_parameter_name())
            || name.eq_ignore_ascii_case(&self.query_parameter)
            || self
                .reserved
                .iter()
                .any(|reserved| reserved.eq_ignore_ascii_case(name))
    }

    /// Resolves request parameters, in request order.
    pub fn resolve(&self, params: &[(String, String)]) -> Result<Searchable> {
        let parser = Parser::new(self.parser.clone());
        let query_parameter = self.query_parameter_name();

        if let Some((_, query)) = params.iter().find(|(name, _)| *name == query_parameter) {
            return parser.parse(query);
        }

        let mut terms = Vec::new();
        for (name, value) in params {
            if self.is_reserved(name) {
                continue;
            }
            match legacy_term(name, value)? {
                Some(term) => terms.push(term),
                None => debug!("ignoring blank search parameter '{}'", name),
            }
        }

        if terms.is_empty() {
            return Ok(Searchable::Empty);
        }
        let text = join_balanced(&terms);
        warn!(
            "search built from per-field request parameters, clients should send '{}' instead: {}",
            query_parameter, text
        );
        parser.parse(&text)
    }
}

/// Resolves with the default configuration.
pub fn resolve(params: &[(String, String)]) -> Result<Searchable> {
    ResolverConfig::default().resolve(params)
}

/// ANDs terms as a balanced tree so nesting grows with log2 of the field count.
/// Left halves take the extra term: `[a, b, c]` gives `((a AND b) AND c)`.
fn join_balanced(terms: &[String]) -> String {
    if terms.len() == 1 {
        return terms[0].clone();
    }
    let (left, right) = terms.split_at(terms.len().div_ceil(2));
    format!("({} AND {})", join_balanced(left), join_balanced(right))
}

/// Canonical text for one legacy parameter; `None` when there is nothing to search on.
fn legacy_term(name: &str, value: &str) -> Result<Option<String>> {
    let (field, code) = match field_with_code_regex().captures(name) {
        Some(captures) => {
            let code = captures[2].trim().to_string();
            if code.is_empty() {
                return Err(SearchError::invalid_predicate(format!(
                    "parameter '{}' has an empty operator code",
                    name
                )));
            }
            (captures[1].to_string(), Some(code))
        }
        None if name.contains(['[', ']']) => {
            return Err(SearchError::invalid_predicate(format!(
                "malformed search parameter '{}', expected 'field' or 'field[code]'",
                name
            )));
        }
        None => (name.to_string(), None),
    };
    if field.is_empty() || !field.chars().all(is_name_char) {
        return Err(SearchError::invalid_predicate(format!(
            "search parameter '{}' is not a valid attribute name",
            field
        )));
    }
    let bad_code = code
        .as_deref()
        .filter(|c| !c.chars().all(|ch| ch.is_ascii_alphanumeric()));
    if let Some(code) = bad_code {
        return Err(SearchError::invalid_predicate(format!(
            "search parameter '{}' has an invalid operator code '{}'",
            name, code
        )));
    }

    match (code, value.is_empty()) {
        (Some(code), true) => Ok(Some(format!("{}|{}:", field, code))),
        (Some(code), false) => Ok(Some(format!("{}|{}:{}", field, code, quote(value)))),
        (None, true) => Ok(None),
        // A bare field means equality
        (None, false) => Ok(Some(format!("{}|eq:{}", field, quote(value)))),
    }
}

/// Quotes a raw request value. Commas are left alone so `in`/`ni` lists still split.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push(QUOTE);
    for ch in value.chars() {
        if ch == QUOTE || ch == ESCAPE {
            quoted.push(ESCAPE);
        }
        quoted.push(ch);
    }
    quoted.push(QUOTE);
    quoted
}
