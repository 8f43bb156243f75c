use super::CommandContext;
use crate::argparse::{QueryArgs, SqlArgs};
use anyhow::Result;
use searchable::{build_where_with_offset, translate, FilterExpression};

fn filter_expression(query: &str, context: &CommandContext) -> Result<Option<FilterExpression>> {
    let searchable = context.parser.parse(query)?;
    Ok(translate(&searchable, &context.schema)?)
}

pub fn handle_parse_command(args: QueryArgs, context: &CommandContext) -> Result<String> {
    Ok(context.parser.parse(&args.query)?.to_query_string())
}

pub fn handle_translate_command(args: QueryArgs, context: &CommandContext) -> Result<String> {
    let expr = filter_expression(&args.query, context)?;
    Ok(serde_json::to_string_pretty(&expr)?)
}

/// First line is the WHERE fragment (empty without a filter), second the bind values.
pub fn handle_sql_command(args: SqlArgs, context: &CommandContext) -> Result<String> {
    match filter_expression(&args.query, context)? {
        Some(expr) => {
            let built = build_where_with_offset(&expr, args.offset)?;
            Ok(format!(
                "{}\n{}",
                built.sql,
                serde_json::to_string(&built.params)?
            ))
        }
        None => Ok("\n[]".to_string()),
    }
}
