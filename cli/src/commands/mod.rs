mod filter;
mod params;
mod query;

use crate::argparse::{Cli, Commands};
use crate::{CliError, SCHEMA_ENV_VAR};
use anyhow::Result;
pub use filter::handle_filter_command;
use log::debug;
pub use params::handle_params_command;
pub use query::{handle_parse_command, handle_sql_command, handle_translate_command};
use searchable::{Parser, ParserConfig, Schema};
use std::path::PathBuf;

/// What every command needs: a configured parser and the attribute types
pub struct CommandContext {
    pub parser: Parser,
    pub schema: Schema,
}

impl CommandContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let defaults = ParserConfig::default();
        let parser = Parser::new(ParserConfig {
            max_query_length: cli.max_length.unwrap_or(defaults.max_query_length),
            max_depth: cli.max_depth.unwrap_or(defaults.max_depth),
        });

        let env_schema = std::env::var(SCHEMA_ENV_VAR).ok();
        let schema = match schema_path(cli.schema.clone(), env_schema) {
            Some(path) => {
                let schema =
                    Schema::load(&path).map_err(|e| CliError::SchemaLoad(path.clone(), e))?;
                debug!(
                    "loaded {} attribute types from {}",
                    schema.attributes.len(),
                    path.display()
                );
                schema
            }
            None => Schema::default(),
        };

        Ok(Self { parser, schema })
    }
}

/// `--schema` wins over the environment; a blank variable counts as unset.
pub fn schema_path(flag: Option<PathBuf>, env: Option<String>) -> Option<PathBuf> {
    flag.or_else(|| env.filter(|value| !value.trim().is_empty()).map(PathBuf::from))
}

/// Runs a command and returns what should be printed.
pub fn handle_command(cli: Cli) -> Result<String> {
    let context = CommandContext::from_cli(&cli)?;
    match cli.command {
        Commands::Parse(args) => handle_parse_command(args, &context),
        Commands::Translate(args) => handle_translate_command(args, &context),
        Commands::Sql(args) => handle_sql_command(args, &context),
        Commands::Filter(args) => handle_filter_command(args, &context),
        Commands::Params(args) => handle_params_command(args, &context),
    }
}
