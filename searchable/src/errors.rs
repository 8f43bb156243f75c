/// Longest slice of the input echoed back in a parse error
const FRAGMENT_LEN: usize = 16;

/// Errors raised while building, parsing or translating a search predicate
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    /// Malformed query text
    Parse {
        position: usize,
        fragment: String,
        reason: String,
    },
    /// Operator code that is not in the catalog
    UnknownOperator(String),
    /// Operator arity does not match the supplied value(s), or a name/value is illegal
    InvalidPredicate(String),
    /// Literal cannot be converted to the attribute's declared type
    ValueCoercion {
        attribute: String,
        literal: String,
        target_type: String,
    },
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// Builds a parse error pointing at `position` (a character offset) in `input`.
    pub fn parse(input: &[char], position: usize, reason: impl Into<String>) -> Self {
        let fragment = input
            .iter()
            .skip(position)
            .take(FRAGMENT_LEN)
            .collect::<String>();
        SearchError::Parse {
            position,
            fragment,
            reason: reason.into(),
        }
    }

    pub fn invalid_predicate(reason: impl Into<String>) -> Self {
        SearchError::InvalidPredicate(reason.into())
    }

    /// Short stable tag, handy when mapping errors to API responses
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::Parse { .. } => "parse",
            SearchError::UnknownOperator(_) => "unknown_operator",
            SearchError::InvalidPredicate(_) => "invalid_predicate",
            SearchError::ValueCoercion { .. } => "value_coercion",
        }
    }
}

impl From<SearchError> for String {
    fn from(error: SearchError) -> Self {
        error.to_string()
    }
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::Parse {
                position,
                fragment,
                reason,
            } => {
                if fragment.is_empty() {
                    write!(f, "Parse error at position {}: {}", position, reason)
                } else {
                    write!(
                        f,
                        "Parse error at position {}: {} (near '{}')",
                        position, reason, fragment
                    )
                }
            }
            SearchError::UnknownOperator(code) => write!(f, "Unknown operator: '{}'", code),
            SearchError::InvalidPredicate(reason) => write!(f, "Invalid predicate: {}", reason),
            SearchError::ValueCoercion {
                attribute,
                literal,
                target_type,
            } => write!(
                f,
                "Cannot convert value '{}' of attribute '{}' to {}",
                literal, attribute, target_type
            ),
        }
    }
}

impl std::error::Error for SearchError {}
