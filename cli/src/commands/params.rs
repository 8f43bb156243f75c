use super::CommandContext;
use crate::argparse::ParamsArgs;
use crate::CliError;
use anyhow::Result;
use searchable::ResolverConfig;

fn split_param(param: &str) -> Result<(String, String), CliError> {
    match param.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(CliError::InvalidParam(param.to_string())),
    }
}

pub fn handle_params_command(args: ParamsArgs, context: &CommandContext) -> Result<String> {
    let params = args
        .params
        .iter()
        .map(|param| split_param(param))
        .collect::<Result<Vec<_>, _>>()?;

    let config = ResolverConfig {
        prefix: args.prefix,
        parser: context.parser.config().clone(),
        ..ResolverConfig::default()
    }
    .with_reserved(args.reserved);

    Ok(config.resolve(&params)?.to_query_string())
}
