use super::CommandContext;
use crate::argparse::FilterArgs;
use crate::CliError;
use anyhow::Result;
use log::info;
use searchable::{json, translate};
use serde_json::Value;

pub fn handle_filter_command(args: FilterArgs, context: &CommandContext) -> Result<String> {
    let content = std::fs::read_to_string(&args.input)
        .map_err(|e| CliError::InputRead(args.input.clone(), e))?;
    let documents = match serde_json::from_str::<Value>(&content)
        .map_err(|e| CliError::InvalidInput(args.input.clone(), e))?
    {
        Value::Array(documents) => documents,
        document => vec![document],
    };

    let searchable = context.parser.parse(&args.query)?;
    let kept: Vec<&Value> = match translate(&searchable, &context.schema)? {
        Some(expr) => json::filter_documents(&expr, &documents),
        None => documents.iter().collect(),
    };
    info!("{} of {} documents match", kept.len(), documents.len());

    Ok(serde_json::to_string_pretty(&kept)?)
}
