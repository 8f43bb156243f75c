use crate::errors::{Result, SearchError};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::OnceLock;

/// How many values an operator takes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    /// `name|nn:`
    None,
    /// `name|eq:"value"`
    Single,
    /// `name|in:"v1,v2"`
    Multiple,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Like,
    NotLike,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

/// The catalog, one row per `Operator` variant in declaration order.
/// Adding an operator means adding a variant above and a row here.
const CATALOG: &[(Operator, &str, Arity)] = &[
    (Operator::Equal, "eq", Arity::Single),
    (Operator::NotEqual, "ne", Arity::Single),
    (Operator::GreaterThan, "gt", Arity::Single),
    (Operator::GreaterOrEqual, "ge", Arity::Single),
    (Operator::LessThan, "lt", Arity::Single),
    (Operator::LessOrEqual, "le", Arity::Single),
    (Operator::Like, "lk", Arity::Single),
    (Operator::NotLike, "nl", Arity::Single),
    (Operator::StartsWith, "sw", Arity::Single),
    (Operator::EndsWith, "ew", Arity::Single),
    (Operator::In, "in", Arity::Multiple),
    (Operator::NotIn, "ni", Arity::Multiple),
    (Operator::IsNull, "nu", Arity::None),
    (Operator::IsNotNull, "nn", Arity::None),
];

static BY_CODE: OnceLock<HashMap<&'static str, Operator>> = OnceLock::new();

fn by_code() -> &'static HashMap<&'static str, Operator> {
    BY_CODE.get_or_init(|| CATALOG.iter().map(|(op, code, _)| (*code, *op)).collect())
}

/// Resolves an operator from its canonical short code.
pub fn lookup(code: &str) -> Result<Operator> {
    by_code()
        .get(code)
        .copied()
        .ok_or_else(|| SearchError::UnknownOperator(code.to_string()))
}

impl Operator {
    fn row(&self) -> &'static (Operator, &'static str, Arity) {
        &CATALOG[*self as usize]
    }

    pub fn code(&self) -> &'static str {
        self.row().1
    }

    pub fn arity(&self) -> Arity {
        self.row().2
    }

    /// All operators in catalog order
    pub fn all() -> impl Iterator<Item = Operator> {
        CATALOG.iter().map(|(op, _, _)| *op)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Operator {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        lookup(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_operator_has_a_row() {
        let all = [
            Operator::Equal,
            Operator::NotEqual,
            Operator::GreaterThan,
            Operator::GreaterOrEqual,
            Operator::LessThan,
            Operator::LessOrEqual,
            Operator::Like,
            Operator::NotLike,
            Operator::StartsWith,
            Operator::EndsWith,
            Operator::In,
            Operator::NotIn,
            Operator::IsNull,
            Operator::IsNotNull,
        ];
        for op in all {
            assert_eq!(CATALOG[op as usize].0, op, "catalog row out of order");
        }
        assert_eq!(Operator::all().count(), all.len());
    }

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<_> = CATALOG.iter().map(|(_, code, _)| *code).collect();
        assert_eq!(codes.len(), CATALOG.len());
    }

    #[test]
    fn test_required_codes() {
        assert_eq!(lookup("eq").unwrap(), Operator::Equal);
        assert_eq!(lookup("ge").unwrap(), Operator::GreaterOrEqual);
        assert_eq!(lookup("nn").unwrap(), Operator::IsNotNull);
        assert_eq!(lookup("in").unwrap(), Operator::In);
        assert_eq!(Operator::Equal.arity(), Arity::Single);
        assert_eq!(Operator::GreaterOrEqual.arity(), Arity::Single);
        assert_eq!(Operator::IsNotNull.arity(), Arity::None);
        assert_eq!(Operator::In.arity(), Arity::Multiple);
    }

    #[test]
    fn test_round_trip_through_code() {
        for op in Operator::all() {
            assert_eq!(op.code().parse::<Operator>().unwrap(), op);
            assert_eq!(op.to_string(), op.code());
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(
            lookup("zz"),
            Err(SearchError::UnknownOperator("zz".to_string()))
        );
        // Codes are lowercase only
        assert!(lookup("EQ").is_err());
        assert!(lookup("").is_err());
    }
}
