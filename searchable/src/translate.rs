//! Predicate tree to storage-agnostic filter criteria
//!
//! Literals stay strings in the AST; here they are converted to the type the
//! storage layer declares for each attribute.

use crate::errors::{Result, SearchError};
use crate::operator::Operator;
use crate::predicate::{Predicate, Searchable};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;
use strum_macros::{Display, EnumIter, EnumString};

/// Declared type of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Integer,
    Long,
    Double,
    Float,
    Boolean,
    /// Matched by label, exactly
    Enumeration(Vec<String>),
}

/// Field-less tag of an `AttributeType`, as written in schema files
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    String,
    Integer,
    Long,
    Double,
    Float,
    Boolean,
    Enumeration,
}

impl AttributeType {
    pub fn tag(&self) -> TypeTag {
        match self {
            AttributeType::String => TypeTag::String,
            AttributeType::Integer => TypeTag::Integer,
            AttributeType::Long => TypeTag::Long,
            AttributeType::Double => TypeTag::Double,
            AttributeType::Float => TypeTag::Float,
            AttributeType::Boolean => TypeTag::Boolean,
            AttributeType::Enumeration(_) => TypeTag::Enumeration,
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeType::Enumeration(labels) => {
                write!(f, "enumeration ({})", labels.join(", "))
            }
            other => write!(f, "{}", other.tag()),
        }
    }
}

/// Typed value handed to the storage layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FilterValue {
    String(String),
    Integer(i32),
    Long(i64),
    Double(f64),
    Float(f32),
    Boolean(bool),
    Enumeration(String),
}

impl FilterValue {
    /// Text form, as used for pattern matching
    pub fn as_text(&self) -> String {
        match self {
            FilterValue::String(s) | FilterValue::Enumeration(s) => s.clone(),
            FilterValue::Integer(i) => i.to_string(),
            FilterValue::Long(l) => l.to_string(),
            FilterValue::Double(d) => d.to_string(),
            FilterValue::Float(f) => f.to_string(),
            FilterValue::Boolean(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    /// Case-insensitive "contains"
    Like,
    NotLike,
    StartsWith,
    EndsWith,
}

/// Backend-agnostic filter tree, walked by a storage adapter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterExpression {
    Comparison {
        attribute: String,
        operator: ComparisonOperator,
        value: FilterValue,
    },
    Membership {
        attribute: String,
        values: Vec<FilterValue>,
    },
    IsNull {
        attribute: String,
    },
    IsNotNull {
        attribute: String,
    },
    And(Box<FilterExpression>, Box<FilterExpression>),
    Or(Box<FilterExpression>, Box<FilterExpression>),
    Not(Box<FilterExpression>),
}

/// Schema knowledge of the storage layer: the declared type of an attribute.
/// `None` means the attribute is not typed and its literals stay strings.
pub trait TypeResolver {
    fn resolve(&self, attribute: &str) -> Option<AttributeType>;
}

impl<F> TypeResolver for F
where
    F: Fn(&str) -> Option<AttributeType>,
{
    fn resolve(&self, attribute: &str) -> Option<AttributeType> {
        self(attribute)
    }
}

impl TypeResolver for HashMap<String, AttributeType> {
    fn resolve(&self, attribute: &str) -> Option<AttributeType> {
        self.get(attribute).cloned()
    }
}

type Coercion = fn(&str, &AttributeType) -> Option<FilterValue>;

fn coerce_string(literal: &str, _: &AttributeType) -> Option<FilterValue> {
    Some(FilterValue::String(literal.to_string()))
}

fn coerce_integer(literal: &str, _: &AttributeType) -> Option<FilterValue> {
    literal.parse().ok().map(FilterValue::Integer)
}

fn coerce_long(literal: &str, _: &AttributeType) -> Option<FilterValue> {
    literal.parse().ok().map(FilterValue::Long)
}

// NaN and infinities have no SQL counterpart, and out-of-range text rounds to infinity
fn coerce_double(literal: &str, _: &AttributeType) -> Option<FilterValue> {
    literal
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(FilterValue::Double)
}

fn coerce_float(literal: &str, _: &AttributeType) -> Option<FilterValue> {
    literal
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .map(FilterValue::Float)
}

fn coerce_boolean(literal: &str, _: &AttributeType) -> Option<FilterValue> {
    if literal.eq_ignore_ascii_case("true") {
        Some(FilterValue::Boolean(true))
    } else if literal.eq_ignore_ascii_case("false") {
        Some(FilterValue::Boolean(false))
    } else {
        None
    }
}

fn coerce_enumeration(literal: &str, attribute_type: &AttributeType) -> Option<FilterValue> {
    match attribute_type {
        AttributeType::Enumeration(labels) if labels.iter().any(|l| l == literal) => {
            Some(FilterValue::Enumeration(literal.to_string()))
        }
        _ => None,
    }
}

/// One row per type tag. A new attribute type is a new row.
const COERCIONS: &[(TypeTag, Coercion)] = &[
    (TypeTag::String, coerce_string),
    (TypeTag::Integer, coerce_integer),
    (TypeTag::Long, coerce_long),
    (TypeTag::Double, coerce_double),
    (TypeTag::Float, coerce_float),
    (TypeTag::Boolean, coerce_boolean),
    (TypeTag::Enumeration, coerce_enumeration),
];

static COERCION_TABLE: OnceLock<HashMap<TypeTag, Coercion>> = OnceLock::new();

fn coercion_table() -> &'static HashMap<TypeTag, Coercion> {
    COERCION_TABLE.get_or_init(|| COERCIONS.iter().copied().collect())
}

/// Converts a literal to the declared type of `attribute`.
pub fn coerce(attribute: &str, literal: &str, attribute_type: &AttributeType) -> Result<FilterValue> {
    coercion_table()
        .get(&attribute_type.tag())
        .and_then(|coercion| coercion(literal, attribute_type))
        .ok_or_else(|| SearchError::ValueCoercion {
            attribute: attribute.to_string(),
            literal: literal.to_string(),
            target_type: attribute_type.to_string(),
        })
}

fn comparison_operator(operator: Operator) -> Option<ComparisonOperator> {
    match operator {
        Operator::Equal => Some(ComparisonOperator::Equal),
        Operator::NotEqual => Some(ComparisonOperator::NotEqual),
        Operator::GreaterThan => Some(ComparisonOperator::GreaterThan),
        Operator::GreaterOrEqual => Some(ComparisonOperator::GreaterOrEqual),
        Operator::LessThan => Some(ComparisonOperator::LessThan),
        Operator::LessOrEqual => Some(ComparisonOperator::LessOrEqual),
        Operator::Like => Some(ComparisonOperator::Like),
        Operator::NotLike => Some(ComparisonOperator::NotLike),
        Operator::StartsWith => Some(ComparisonOperator::StartsWith),
        Operator::EndsWith => Some(ComparisonOperator::EndsWith),
        Operator::In | Operator::NotIn | Operator::IsNull | Operator::IsNotNull => None,
    }
}

fn unsupported(operator: Operator, name: &str) -> SearchError {
    SearchError::invalid_predicate(format!(
        "operator '{}' cannot be applied to '{}' in this form",
        operator, name
    ))
}

/// Translates a searchable; `Empty` gives `None` (no filter).
pub fn translate<R>(searchable: &Searchable, resolver: &R) -> Result<Option<FilterExpression>>
where
    R: TypeResolver + ?Sized,
{
    match searchable {
        Searchable::Empty => Ok(None),
        Searchable::Predicate(predicate) => {
            let expression = translate_predicate(predicate, resolver)?;
            debug!(
                "translated search on [{}]",
                predicate.attribute_names().join(", ")
            );
            Ok(Some(expression))
        }
    }
}

pub fn translate_predicate<R>(predicate: &Predicate, resolver: &R) -> Result<FilterExpression>
where
    R: TypeResolver + ?Sized,
{
    match predicate {
        Predicate::NoValue { name, operator } => match operator {
            Operator::IsNull => Ok(FilterExpression::IsNull {
                attribute: name.clone(),
            }),
            Operator::IsNotNull => Ok(FilterExpression::IsNotNull {
                attribute: name.clone(),
            }),
            other => Err(unsupported(*other, name)),
        },
        Predicate::SingleValue {
            name,
            operator,
            value,
        } => {
            let comparison = comparison_operator(*operator).ok_or_else(|| unsupported(*operator, name))?;
            let attribute_type = resolver.resolve(name).unwrap_or(AttributeType::String);
            Ok(FilterExpression::Comparison {
                attribute: name.clone(),
                operator: comparison,
                value: coerce(name, value, &attribute_type)?,
            })
        }
        Predicate::MultipleValues {
            name,
            operator,
            values,
        } => {
            let attribute_type = resolver.resolve(name).unwrap_or(AttributeType::String);
            let values = values
                .iter()
                .map(|value| coerce(name, value, &attribute_type))
                .collect::<Result<Vec<_>>>()?;
            let membership = FilterExpression::Membership {
                attribute: name.clone(),
                values,
            };
            match operator {
                Operator::In => Ok(membership),
                Operator::NotIn => Ok(FilterExpression::Not(Box::new(membership))),
                other => Err(unsupported(*other, name)),
            }
        }
        Predicate::And(left, right) => Ok(FilterExpression::And(
            Box::new(translate_predicate(left, resolver)?),
            Box::new(translate_predicate(right, resolver)?),
        )),
        Predicate::Or(left, right) => Ok(FilterExpression::Or(
            Box::new(translate_predicate(left, resolver)?),
            Box::new(translate_predicate(right, resolver)?),
        )),
        Predicate::Not(inner) => match inner.as_ref() {
            // !!p is p
            Predicate::Not(twice) => translate_predicate(twice, resolver),
            other => Ok(FilterExpression::Not(Box::new(translate_predicate(
                other, resolver,
            )?))),
        },
    }
}

#[cfg(test)]
mod tests;
