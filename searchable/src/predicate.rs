//! Predicate AST for the search language
//!
//! Trees are immutable: `and`, `or` and `not` build new nodes that share
//! their operands through `Arc`, so a tree can be handed to other threads.

use crate::errors::{Result, SearchError};
use crate::operator::{Arity, Operator};
use std::sync::Arc;

/// Characters that have a structural meaning in query text
const RESERVED_NAME_CHARS: &[char] = &['|', ':', '(', ')', '"', '!', ',', '\\'];

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    NoValue {
        name: String,
        operator: Operator,
    },
    SingleValue {
        name: String,
        operator: Operator,
        value: String,
    },
    MultipleValues {
        name: String,
        operator: Operator,
        values: Vec<String>,
    },
    And(Arc<Predicate>, Arc<Predicate>),
    Or(Arc<Predicate>, Arc<Predicate>),
    Not(Arc<Predicate>),
}

/// Root of a search: nothing to filter on, or a single predicate tree
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Searchable {
    #[default]
    Empty,
    Predicate(Predicate),
}

pub(crate) fn is_name_char(ch: char) -> bool {
    !ch.is_whitespace() && !RESERVED_NAME_CHARS.contains(&ch)
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SearchError::invalid_predicate("attribute name is empty"));
    }
    if let Some(ch) = name.chars().find(|c| !is_name_char(*c)) {
        return Err(SearchError::invalid_predicate(format!(
            "attribute name '{}' contains reserved character '{}'",
            name, ch
        )));
    }
    Ok(())
}

fn validate_arity(name: &str, operator: Operator, expected: Arity) -> Result<()> {
    if operator.arity() != expected {
        return Err(SearchError::invalid_predicate(format!(
            "operator '{}' on '{}' takes {} but {} given",
            operator,
            name,
            describe_arity(operator.arity()),
            describe_arity(expected)
        )));
    }
    Ok(())
}

fn describe_arity(arity: Arity) -> &'static str {
    match arity {
        Arity::None => "no value",
        Arity::Single => "a single value",
        Arity::Multiple => "a list of values",
    }
}

fn validate_value(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(SearchError::invalid_predicate(format!(
            "blank value for attribute '{}'",
            name
        )));
    }
    Ok(())
}

impl Predicate {
    /// `name|code:` for operators that take no value (is-null, is-not-null).
    pub fn no_value(name: impl Into<String>, operator: Operator) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        validate_arity(&name, operator, Arity::None)?;
        Ok(Predicate::NoValue { name, operator })
    }

    /// `name|code:"value"` for single-value operators.
    pub fn single_value(
        name: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let value = value.into();
        validate_name(&name)?;
        validate_arity(&name, operator, Arity::Single)?;
        validate_value(&name, &value)?;
        Ok(Predicate::SingleValue {
            name,
            operator,
            value,
        })
    }

    /// `name|code:"v1,v2"` for membership operators. Order is kept.
    pub fn multiple_values<I, S>(name: impl Into<String>, operator: Operator, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        validate_name(&name)?;
        validate_arity(&name, operator, Arity::Multiple)?;
        if values.is_empty() {
            return Err(SearchError::invalid_predicate(format!(
                "operator '{}' on '{}' needs at least one value",
                operator, name
            )));
        }
        for value in &values {
            validate_value(&name, value)?;
        }
        Ok(Predicate::MultipleValues {
            name,
            operator,
            values,
        })
    }

    pub fn and(left: impl Into<Arc<Predicate>>, right: impl Into<Arc<Predicate>>) -> Self {
        Predicate::And(left.into(), right.into())
    }

    pub fn or(left: impl Into<Arc<Predicate>>, right: impl Into<Arc<Predicate>>) -> Self {
        Predicate::Or(left.into(), right.into())
    }

    /// Negation is kept verbatim, `not(not(p))` stays two levels deep.
    pub fn not(inner: impl Into<Arc<Predicate>>) -> Self {
        Predicate::Not(inner.into())
    }

    /// Attribute name for leaves, `None` for composites
    pub fn name(&self) -> Option<&str> {
        match self {
            Predicate::NoValue { name, .. }
            | Predicate::SingleValue { name, .. }
            | Predicate::MultipleValues { name, .. } => Some(name),
            Predicate::And(..) | Predicate::Or(..) | Predicate::Not(..) => None,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match self {
            Predicate::NoValue { operator, .. }
            | Predicate::SingleValue { operator, .. }
            | Predicate::MultipleValues { operator, .. } => Some(*operator),
            Predicate::And(..) | Predicate::Or(..) | Predicate::Not(..) => None,
        }
    }

    /// Leaf attribute names, left to right, duplicates kept
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                Predicate::NoValue { name, .. }
                | Predicate::SingleValue { name, .. }
                | Predicate::MultipleValues { name, .. } => names.push(name.as_str()),
                Predicate::And(left, right) | Predicate::Or(left, right) => {
                    pending.push(right);
                    pending.push(left);
                }
                Predicate::Not(inner) => pending.push(inner),
            }
        }
        names
    }
}

impl Searchable {
    pub fn empty() -> Self {
        Searchable::Empty
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Searchable::Empty)
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        match self {
            Searchable::Empty => None,
            Searchable::Predicate(predicate) => Some(predicate),
        }
    }
}

impl From<Predicate> for Searchable {
    fn from(predicate: Predicate) -> Self {
        Searchable::Predicate(predicate)
    }
}

impl From<Option<Predicate>> for Searchable {
    fn from(predicate: Option<Predicate>) -> Self {
        predicate.map_or(Searchable::Empty, Searchable::Predicate)
    }
}
