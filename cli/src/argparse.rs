use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sq",
    about = "Parse, normalize and translate search queries",
    version,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Schema file (JSON or YAML) declaring attribute types, defaults to $SQ_SCHEMA
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,

    /// Maximum nesting depth of parenthesized groups
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    /// Maximum query length, in characters
    #[arg(long, global = true)]
    pub max_length: Option<usize>,

    /// Pick which subcommand to use
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a query and print its canonical form
    Parse(QueryArgs),
    /// Print the typed filter expression of a query as JSON
    Translate(QueryArgs),
    /// Print the SQL WHERE fragment and bind parameters of a query
    Sql(SqlArgs),
    /// Print the documents of a JSON file that match a query
    Filter(FilterArgs),
    /// Build a query from request-style key=value parameters
    Params(ParamsArgs),
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Query text, e.g. '(lastName|eq:"DOE" AND age|ge:"20")'
    pub query: String,
}

#[derive(Args, Debug)]
pub struct SqlArgs {
    /// Query text
    pub query: String,

    /// Number of placeholders already used by the surrounding statement
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Query text
    pub query: String,

    /// JSON file holding one document or an array of documents
    #[arg(long, short = 'i')]
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// Request parameters as key=value, e.g. 'age[ge]=20' or 'q=lastName|nn:'
    #[arg(required = true)]
    pub params: Vec<String>,

    /// Extra parameter names to ignore, besides paging and sorting
    #[arg(long)]
    pub reserved: Vec<String>,

    /// Prefix of the canonical query parameter
    #[arg(long, default_value = "")]
    pub prefix: String,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
