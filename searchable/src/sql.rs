//! Renders a `FilterExpression` as a parameterized SQL `WHERE` fragment.
//!
//! Values never appear in the SQL text. They are returned in placeholder order
//! as `$1`, `$2`, ... (or from a caller-chosen offset) for the driver to bind.

use crate::errors::{Result, SearchError};
use crate::translate::{ComparisonOperator, FilterExpression, FilterValue};

/// WHERE fragment plus the values to bind, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlWhere {
    pub sql: String,
    pub params: Vec<FilterValue>,
}

/// Builds a SQL WHERE fragment and bind values from a filter expression
/// Uses PostgreSQL-style numbered placeholders ($1, $2, etc.)
pub fn build_where(expr: &FilterExpression) -> Result<SqlWhere> {
    build_where_with_offset(expr, 0)
}

/// Builds a SQL WHERE fragment with a starting placeholder offset
/// Useful when combining with other query parts that already have placeholders
pub fn build_where_with_offset(expr: &FilterExpression, start_offset: usize) -> Result<SqlWhere> {
    let mut params = Vec::new();
    let mut placeholder_idx = start_offset;
    let sql = build_expression_sql(expr, &mut placeholder_idx, &mut params)?;
    Ok(SqlWhere { sql, params })
}

fn build_expression_sql(
    expr: &FilterExpression,
    idx: &mut usize,
    params: &mut Vec<FilterValue>,
) -> Result<String> {
    let sql = match expr {
        FilterExpression::Comparison {
            attribute,
            operator,
            value,
        } => {
            let column = quote_identifier(attribute);
            match operator {
                ComparisonOperator::Equal => build_comparison_clause(&column, "=", value, idx, params),
                ComparisonOperator::NotEqual => build_comparison_clause(&column, "<>", value, idx, params),
                ComparisonOperator::GreaterThan => build_comparison_clause(&column, ">", value, idx, params),
                ComparisonOperator::GreaterOrEqual => {
                    build_comparison_clause(&column, ">=", value, idx, params)
                }
                ComparisonOperator::LessThan => build_comparison_clause(&column, "<", value, idx, params),
                ComparisonOperator::LessOrEqual => build_comparison_clause(&column, "<=", value, idx, params),
                ComparisonOperator::Like => {
                    build_like_clause(&column, LikePattern::Contains, false, value, idx, params)
                }
                ComparisonOperator::NotLike => {
                    build_like_clause(&column, LikePattern::Contains, true, value, idx, params)
                }
                ComparisonOperator::StartsWith => {
                    build_like_clause(&column, LikePattern::Prefix, false, value, idx, params)
                }
                ComparisonOperator::EndsWith => {
                    build_like_clause(&column, LikePattern::Suffix, false, value, idx, params)
                }
            }
        }
        FilterExpression::Membership { attribute, values } => {
            if values.is_empty() {
                return Err(SearchError::invalid_predicate(format!(
                    "membership test on '{}' has no values",
                    attribute
                )));
            }
            build_in_clause(&quote_identifier(attribute), values, idx, params)
        }
        FilterExpression::IsNull { attribute } => format!("{} IS NULL", quote_identifier(attribute)),
        FilterExpression::IsNotNull { attribute } => {
            format!("{} IS NOT NULL", quote_identifier(attribute))
        }
        FilterExpression::And(left, right) => format!(
            "({} AND {})",
            build_expression_sql(left, idx, params)?,
            build_expression_sql(right, idx, params)?
        ),
        FilterExpression::Or(left, right) => format!(
            "({} OR {})",
            build_expression_sql(left, idx, params)?,
            build_expression_sql(right, idx, params)?
        ),
        FilterExpression::Not(inner) => format!("NOT ({})", build_expression_sql(inner, idx, params)?),
    };
    Ok(sql)
}

/// `address.city` becomes `"address"."city"`
fn quote_identifier(attribute: &str) -> String {
    attribute
        .split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

fn next_placeholder(idx: &mut usize) -> String {
    *idx += 1;
    format!("${}", *idx)
}

fn build_comparison_clause(
    column: &str,
    op: &str,
    value: &FilterValue,
    idx: &mut usize,
    params: &mut Vec<FilterValue>,
) -> String {
    params.push(value.clone());
    format!("{} {} {}", column, op, next_placeholder(idx))
}

#[derive(Debug, Clone, Copy)]
enum LikePattern {
    Contains,
    Prefix,
    Suffix,
}

fn build_like_clause(
    column: &str,
    pattern: LikePattern,
    negated: bool,
    value: &FilterValue,
    idx: &mut usize,
    params: &mut Vec<FilterValue>,
) -> String {
    let text = escape_like(&value.as_text().to_lowercase());
    let bound = match pattern {
        LikePattern::Contains => format!("%{}%", text),
        LikePattern::Prefix => format!("{}%", text),
        LikePattern::Suffix => format!("%{}", text),
    };
    params.push(FilterValue::String(bound));
    let placeholder = next_placeholder(idx);
    if negated {
        format!("LOWER({}) NOT LIKE {}", column, placeholder)
    } else {
        format!("LOWER({}) LIKE {}", column, placeholder)
    }
}

/// Wildcards in user input match literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn build_in_clause(
    column: &str,
    values: &[FilterValue],
    idx: &mut usize,
    params: &mut Vec<FilterValue>,
) -> String {
    let placeholders: Vec<String> = values
        .iter()
        .map(|value| {
            params.push(value.clone());
            next_placeholder(idx)
        })
        .collect();
    format!("{} IN ({})", column, placeholders.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::translate::{translate, AttributeType};
    use std::collections::HashMap;

    fn where_for(text: &str) -> SqlWhere {
        let mut types = HashMap::new();
        types.insert("age".to_string(), AttributeType::Integer);
        let expr = translate(&parse(text).unwrap(), &types).unwrap().unwrap();
        build_where(&expr).unwrap()
    }

    #[test]
    fn test_simple_comparison() {
        let built = where_for(r#"age|ge:"20""#);
        assert_eq!(built.sql, r#""age" >= $1"#);
        assert_eq!(built.params, vec![FilterValue::Integer(20)]);

        assert_eq!(where_for(r#"age|ne:"20""#).sql, r#""age" <> $1"#);
    }

    #[test]
    fn test_like_family_lowercases_values() {
        let built = where_for(r#"lastName|lk:"DoE""#);
        assert_eq!(built.sql, r#"LOWER("lastName") LIKE $1"#);
        assert_eq!(built.params, vec![FilterValue::String("%doe%".to_string())]);

        let built = where_for(r#"lastName|nl:"DoE""#);
        assert_eq!(built.sql, r#"LOWER("lastName") NOT LIKE $1"#);

        assert_eq!(
            where_for(r#"lastName|sw:"Do""#).params,
            vec![FilterValue::String("do%".to_string())]
        );
        assert_eq!(
            where_for(r#"lastName|ew:"Oe""#).params,
            vec![FilterValue::String("%oe".to_string())]
        );
    }

    #[test]
    fn test_like_wildcards_are_escaped() {
        let built = where_for(r#"code|lk:"50%_off""#);
        assert_eq!(
            built.params,
            vec![FilterValue::String(r"%50\%\_off%".to_string())]
        );
    }

    #[test]
    fn test_membership_and_negated_membership() {
        let built = where_for(r#"age|in:"1,2,3""#);
        assert_eq!(built.sql, r#""age" IN ($1, $2, $3)"#);
        assert_eq!(built.params.len(), 3);

        let built = where_for(r#"age|ni:"1,2""#);
        assert_eq!(built.sql, r#"NOT ("age" IN ($1, $2))"#);
    }

    #[test]
    fn test_nullity_binds_nothing() {
        let built = where_for("deletedAt|nu:");
        assert_eq!(built.sql, r#""deletedAt" IS NULL"#);
        assert!(built.params.is_empty());
        assert_eq!(where_for("deletedAt|nn:").sql, r#""deletedAt" IS NOT NULL"#);
    }

    #[test]
    fn test_nested_groups_number_placeholders_left_to_right() {
        let built = where_for(r#"((age|gt:"18" AND address.city|eq:"Paris") OR !status|in:"A,B")"#);
        assert_eq!(
            built.sql,
            r#"(("age" > $1 AND "address"."city" = $2) OR NOT ("status" IN ($3, $4)))"#
        );
        assert_eq!(
            built.params,
            vec![
                FilterValue::Integer(18),
                FilterValue::String("Paris".to_string()),
                FilterValue::String("A".to_string()),
                FilterValue::String("B".to_string()),
            ]
        );
    }

    #[test]
    fn test_offset() {
        let expr = translate(&parse(r#"(a|eq:"x" AND b|eq:"y")"#).unwrap(), &HashMap::<String, AttributeType>::new())
            .unwrap()
            .unwrap();
        let built = build_where_with_offset(&expr, 3).unwrap();
        assert_eq!(built.sql, r#"("a" = $4 AND "b" = $5)"#);
    }

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(quote_identifier(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn test_empty_membership_is_rejected() {
        let expr = FilterExpression::Membership {
            attribute: "age".to_string(),
            values: Vec::new(),
        };
        assert!(build_where(&expr).is_err());
    }
}
