use super::*;
use crate::parser::parse;
use std::str::FromStr;
use strum::IntoEnumIterator;

fn people() -> HashMap<String, AttributeType> {
    let mut map = HashMap::new();
    map.insert("age".to_string(), AttributeType::Integer);
    map.insert("balance".to_string(), AttributeType::Long);
    map.insert("score".to_string(), AttributeType::Double);
    map.insert("ratio".to_string(), AttributeType::Float);
    map.insert("verified".to_string(), AttributeType::Boolean);
    map.insert(
        "status".to_string(),
        AttributeType::Enumeration(vec!["ACTIVE".to_string(), "DISABLED".to_string()]),
    );
    map.insert("lastName".to_string(), AttributeType::String);
    map
}

fn translate_text(text: &str) -> Result<Option<FilterExpression>> {
    translate(&parse(text)?, &people())
}

#[test]
fn test_empty_translates_to_no_filter() {
    assert_eq!(translate(&Searchable::Empty, &people()).unwrap(), None);
}

#[test]
fn test_single_value_is_coerced() {
    let expr = translate_text(r#"age|ge:"20""#).unwrap().unwrap();
    assert_eq!(
        expr,
        FilterExpression::Comparison {
            attribute: "age".to_string(),
            operator: ComparisonOperator::GreaterOrEqual,
            value: FilterValue::Integer(20),
        }
    );
}

#[test]
fn test_every_type_tag_coerces() {
    let cases = [
        (r#"age|eq:"-7""#, FilterValue::Integer(-7)),
        (r#"balance|eq:"9000000000""#, FilterValue::Long(9_000_000_000)),
        (r#"score|eq:"2.5""#, FilterValue::Double(2.5)),
        (r#"ratio|eq:"0.5""#, FilterValue::Float(0.5)),
        (r#"verified|eq:"TRUE""#, FilterValue::Boolean(true)),
        (r#"verified|eq:"false""#, FilterValue::Boolean(false)),
        (r#"status|eq:"ACTIVE""#, FilterValue::Enumeration("ACTIVE".to_string())),
        (r#"lastName|eq:"42""#, FilterValue::String("42".to_string())),
    ];
    for (text, expected) in cases {
        match translate_text(text).unwrap() {
            Some(FilterExpression::Comparison { value, .. }) => assert_eq!(value, expected, "{}", text),
            other => panic!("{}: {:?}", text, other),
        }
    }
}

#[test]
fn test_unknown_attribute_stays_string() {
    let expr = translate_text(r#"nickname|sw:"Al""#).unwrap().unwrap();
    assert_eq!(
        expr,
        FilterExpression::Comparison {
            attribute: "nickname".to_string(),
            operator: ComparisonOperator::StartsWith,
            value: FilterValue::String("Al".to_string()),
        }
    );
}

#[test]
fn test_coercion_failures() {
    let err = translate_text(r#"age|eq:"abc""#).unwrap_err();
    assert_eq!(
        err,
        SearchError::ValueCoercion {
            attribute: "age".to_string(),
            literal: "abc".to_string(),
            target_type: "integer".to_string(),
        }
    );
    assert_eq!(err.kind(), "value_coercion");

    for text in [
        r#"age|eq:" 20""#,
        r#"age|eq:"3000000000""#,
        r#"verified|eq:"yes""#,
        r#"status|eq:"active""#,
        r#"score|eq:"1,5""#,
        r#"score|eq:"NaN""#,
        r#"score|gt:"inf""#,
        r#"score|lt:"-infinity""#,
        r#"score|lt:"1e400""#,
        r#"ratio|eq:"NaN""#,
        r#"ratio|gt:"1e39""#,
    ] {
        assert!(
            matches!(translate_text(text), Err(SearchError::ValueCoercion { .. })),
            "{}",
            text
        );
    }
}

#[test]
fn test_enumeration_error_names_labels() {
    match translate_text(r#"status|eq:"GONE""#) {
        Err(SearchError::ValueCoercion { target_type, .. }) => {
            assert_eq!(target_type, "enumeration (ACTIVE, DISABLED)")
        }
        other => panic!("{:?}", other),
    }
}

#[test]
fn test_membership() {
    let expr = translate_text(r#"age|in:"1,2,3""#).unwrap().unwrap();
    assert_eq!(
        expr,
        FilterExpression::Membership {
            attribute: "age".to_string(),
            values: vec![
                FilterValue::Integer(1),
                FilterValue::Integer(2),
                FilterValue::Integer(3)
            ],
        }
    );

    let expr = translate_text(r#"status|ni:"DISABLED""#).unwrap().unwrap();
    assert_eq!(
        expr,
        FilterExpression::Not(Box::new(FilterExpression::Membership {
            attribute: "status".to_string(),
            values: vec![FilterValue::Enumeration("DISABLED".to_string())],
        }))
    );

    // One bad element fails the whole translation
    assert!(translate_text(r#"age|in:"1,two,3""#).is_err());
}

#[test]
fn test_nullity() {
    assert_eq!(
        translate_text("age|nu:").unwrap().unwrap(),
        FilterExpression::IsNull {
            attribute: "age".to_string()
        }
    );
    assert_eq!(
        translate_text("age|nn:").unwrap().unwrap(),
        FilterExpression::IsNotNull {
            attribute: "age".to_string()
        }
    );
}

#[test]
fn test_composites() {
    let expr = translate_text(r#"((age|gt:"18" AND verified|eq:"true") OR !status|eq:"ACTIVE")"#)
        .unwrap()
        .unwrap();
    match expr {
        FilterExpression::Or(left, right) => {
            assert!(matches!(*left, FilterExpression::And(_, _)));
            assert!(matches!(*right, FilterExpression::Not(_)));
        }
        other => panic!("{:?}", other),
    }
}

#[test]
fn test_double_negation_is_simplified() {
    let once = translate_text("!age|nn:").unwrap().unwrap();
    let twice = translate_text("!!age|nn:").unwrap().unwrap();
    let thrice = translate_text("!!!age|nn:").unwrap().unwrap();
    assert_eq!(
        twice,
        FilterExpression::IsNotNull {
            attribute: "age".to_string()
        }
    );
    assert_eq!(once, thrice);
}

#[test]
fn test_translation_is_deterministic() {
    let searchable =
        parse(r#"((age|in:"1,2" AND score|lt:"9.5") OR (status|ne:"DISABLED" AND !lastName|lk:"doe"))"#)
            .unwrap();
    let resolver = people();
    assert_eq!(
        translate(&searchable, &resolver).unwrap(),
        translate(&searchable, &resolver).unwrap()
    );
}

#[test]
fn test_closure_resolver() {
    let resolver = |attribute: &str| {
        if attribute.ends_with("_count") {
            Some(AttributeType::Long)
        } else {
            None
        }
    };
    let expr = translate(&parse(r#"login_count|le:"5""#).unwrap(), &resolver)
        .unwrap()
        .unwrap();
    assert!(matches!(
        expr,
        FilterExpression::Comparison {
            value: FilterValue::Long(5),
            ..
        }
    ));
}

#[test]
fn test_type_tags_round_trip_through_text() {
    for tag in TypeTag::iter() {
        assert_eq!(TypeTag::from_str(&tag.to_string()).unwrap(), tag);
    }
    assert_eq!(TypeTag::Boolean.to_string(), "boolean");
    assert!(TypeTag::from_str("date").is_err());
    // Every tag has a registered coercion
    for tag in TypeTag::iter() {
        assert!(coercion_table().contains_key(&tag), "{}", tag);
    }
}

#[test]
fn test_filter_expression_serializes() {
    let expr = translate_text(r#"age|ge:"20""#).unwrap().unwrap();
    let json = serde_json::to_value(&expr).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "comparison": {
                "attribute": "age",
                "operator": "greater_or_equal",
                "value": {"type": "integer", "value": 20}
            }
        })
    );
}
