//! Shared predicates for the integration tests

#![allow(dead_code)]

use searchable::{Operator, Predicate};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn last_name_eq() -> Predicate {
    Predicate::single_value("lastName", Operator::Equal, "John DOE").unwrap()
}

pub fn first_name_eq() -> Predicate {
    Predicate::single_value("firstName", Operator::Equal, "Alice DOE").unwrap()
}

pub fn age_ge() -> Predicate {
    Predicate::single_value("age", Operator::GreaterOrEqual, "20").unwrap()
}

/// Leaves covering every operator, with values that need escaping
pub fn leaves() -> Vec<Predicate> {
    let mut leaves = Vec::new();
    for operator in Operator::all() {
        let leaf = match operator.arity() {
            searchable::Arity::None => Predicate::no_value("deletedAt", operator),
            searchable::Arity::Single => {
                Predicate::single_value("address.city", operator, r#"Rot"ter\dam, (NL) AND x"#)
            }
            searchable::Arity::Multiple => {
                Predicate::multiple_values("status", operator, ["A,B", r#"C"D"#, r"E\F", "OR"])
            }
        };
        leaves.push(leaf.unwrap());
    }
    leaves
}

/// Hand-built trees mixing every node kind, up to a few levels deep
pub fn corpus() -> Vec<Predicate> {
    let leaves = leaves();
    let mut corpus = leaves.clone();
    for (i, left) in leaves.iter().enumerate() {
        let right = &leaves[(i + 3) % leaves.len()];
        corpus.push(Predicate::not(left.clone()));
        corpus.push(Predicate::not(Predicate::not(left.clone())));
        corpus.push(Predicate::and(left.clone(), right.clone()));
        corpus.push(Predicate::or(Predicate::not(left.clone()), right.clone()));
        corpus.push(Predicate::not(Predicate::and(
            Predicate::or(left.clone(), right.clone()),
            Predicate::not(Predicate::or(right.clone(), left.clone())),
        )));
    }
    corpus
}
