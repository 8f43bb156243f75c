//! Text search language for resource collections.
//!
//! A query such as `((lastName|eq:"DOE" AND age|ge:"20") OR !status|nu:)` is
//! parsed into an immutable [`Predicate`] tree, serialized back to the same
//! canonical text, and translated into a typed [`FilterExpression`] that a
//! storage adapter ([`sql`], [`json`]) turns into an actual filter.

pub mod errors;
pub mod json;
pub mod operator;
pub mod parser;
pub mod predicate;
pub mod query_params;
pub mod schema;
mod serialize;
pub mod sql;
pub mod translate;

pub use errors::{Result, SearchError};
pub use operator::{Arity, Operator};
pub use parser::{parse, Parser, ParserConfig};
pub use predicate::{Predicate, Searchable};
pub use query_params::ResolverConfig;
pub use schema::{AttributeSpec, Schema};
pub use sql::{build_where, build_where_with_offset, SqlWhere};
pub use translate::{
    coerce, translate, translate_predicate, AttributeType, ComparisonOperator, FilterExpression,
    FilterValue, TypeResolver, TypeTag,
};
