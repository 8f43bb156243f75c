//! Evaluates a `FilterExpression` against JSON documents in memory.
//!
//! Missing and `null` attributes behave like SQL `NULL`: a comparison or
//! membership test on them is unknown, `NOT` of unknown stays unknown, and
//! `AND`/`OR` follow three-valued logic. A document is kept only when the
//! whole expression is true, so it matches what `sql::build_where` selects.

use crate::translate::{ComparisonOperator, FilterExpression, FilterValue};
use serde_json::Value;
use std::cmp::Ordering;

/// Values reached by a dotted path. Arrays on the way fan out to every element.
fn find_values<'a>(json: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut current = vec![json];
    for part in key.split('.') {
        let mut next = Vec::new();
        for value in current {
            collect_field(value, part, &mut next);
        }
        current = next;
    }
    current
}

fn collect_field<'a>(value: &'a Value, part: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if let Some(v) = map.get(part) {
                out.push(v);
            }
        }
        Value::Array(arr) => {
            for v in arr {
                collect_field(v, part, out);
            }
        }
        _ => {}
    }
}

/// Leaf values at `key`, arrays flattened and nulls dropped
fn present_values<'a>(json: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut leaves = Vec::new();
    let mut pending = find_values(json, key);
    while let Some(value) = pending.pop() {
        match value {
            Value::Null => {}
            Value::Array(arr) => pending.extend(arr.iter()),
            other => leaves.push(other),
        }
    }
    leaves
}

fn parse_value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(num) => num.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(num) => Some(num.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Exact integer ordering; floats only when the document value is not integral.
fn compare_integer(value: &Value, n: i64) -> Option<Ordering> {
    match value {
        Value::Number(num) => match (num.as_i64(), num.as_u64()) {
            (Some(v), _) => Some(v.cmp(&n)),
            // Above i64::MAX
            (None, Some(_)) => Some(Ordering::Greater),
            (None, None) => num.as_f64()?.partial_cmp(&(n as f64)),
        },
        Value::String(s) => match s.parse::<i64>() {
            Ok(v) => Some(v.cmp(&n)),
            Err(_) => s.parse::<f64>().ok()?.partial_cmp(&(n as f64)),
        },
        _ => None,
    }
}

/// Orders a document value against a filter value; `None` when they cannot be compared.
fn compare(value: &Value, other: &FilterValue) -> Option<Ordering> {
    match other {
        FilterValue::Integer(i) => compare_integer(value, i64::from(*i)),
        FilterValue::Long(l) => compare_integer(value, *l),
        FilterValue::Double(d) => parse_value_as_f64(value)?.partial_cmp(d),
        // Compared at the attribute's own precision
        FilterValue::Float(f) => (parse_value_as_f64(value)? as f32).partial_cmp(f),
        FilterValue::Boolean(b) => match value {
            Value::Bool(v) => Some(v.cmp(b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true.cmp(b)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false.cmp(b)),
            _ => None,
        },
        FilterValue::String(s) | FilterValue::Enumeration(s) => {
            Some(value_as_text(value)?.as_str().cmp(s.as_str()))
        }
    }
}

fn like(value: &Value, other: &FilterValue, operator: ComparisonOperator) -> bool {
    let Some(text) = value_as_text(value) else {
        return false;
    };
    let text = text.to_lowercase();
    let pattern = other.as_text().to_lowercase();
    match operator {
        ComparisonOperator::StartsWith => text.starts_with(&pattern),
        ComparisonOperator::EndsWith => text.ends_with(&pattern),
        _ => text.contains(&pattern),
    }
}

fn compare_matches(value: &Value, operator: ComparisonOperator, other: &FilterValue) -> bool {
    match operator {
        ComparisonOperator::Like | ComparisonOperator::StartsWith | ComparisonOperator::EndsWith => {
            like(value, other, operator)
        }
        ComparisonOperator::NotLike => {
            value_as_text(value).is_some() && !like(value, other, ComparisonOperator::Like)
        }
        ComparisonOperator::Equal => compare(value, other) == Some(Ordering::Equal),
        ComparisonOperator::NotEqual => {
            matches!(compare(value, other), Some(Ordering::Less | Ordering::Greater))
        }
        ComparisonOperator::GreaterThan => compare(value, other) == Some(Ordering::Greater),
        ComparisonOperator::GreaterOrEqual => {
            matches!(compare(value, other), Some(Ordering::Greater | Ordering::Equal))
        }
        ComparisonOperator::LessThan => compare(value, other) == Some(Ordering::Less),
        ComparisonOperator::LessOrEqual => {
            matches!(compare(value, other), Some(Ordering::Less | Ordering::Equal))
        }
    }
}

/// Any present value satisfying `test`; unknown when the attribute is missing or `null`.
fn any_present(json: &Value, attribute: &str, test: impl Fn(&Value) -> bool) -> Option<bool> {
    let values = present_values(json, attribute);
    if values.is_empty() {
        return None;
    }
    Some(values.into_iter().any(test))
}

/// Three-valued result of `expr`; `None` is SQL's unknown.
fn evaluate(expr: &FilterExpression, json: &Value) -> Option<bool> {
    match expr {
        FilterExpression::Comparison {
            attribute,
            operator,
            value,
        } => any_present(json, attribute, |v| compare_matches(v, *operator, value)),
        FilterExpression::Membership { attribute, values } => any_present(json, attribute, |v| {
            values.iter().any(|other| compare(v, other) == Some(Ordering::Equal))
        }),
        FilterExpression::IsNull { attribute } => Some(present_values(json, attribute).is_empty()),
        FilterExpression::IsNotNull { attribute } => {
            Some(!present_values(json, attribute).is_empty())
        }
        FilterExpression::And(left, right) => match (evaluate(left, json), evaluate(right, json)) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        FilterExpression::Or(left, right) => match (evaluate(left, json), evaluate(right, json)) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        FilterExpression::Not(inner) => evaluate(inner, json).map(|b| !b),
    }
}

/// Whether `json` satisfies `expr`. Unknown results do not match.
pub fn matches(expr: &FilterExpression, json: &Value) -> bool {
    evaluate(expr, json) == Some(true)
}

/// Keeps the documents matching `expr`, in input order.
pub fn filter_documents<'a>(expr: &FilterExpression, documents: &'a [Value]) -> Vec<&'a Value> {
    documents.iter().filter(|doc| matches(expr, doc)).collect()
}
