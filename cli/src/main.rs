use searchable_cli::argparse::parse_args;
use searchable_cli::commands::handle_command;
use searchable_cli::utils::init_logger;

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = parse_args();
    init_logger(cli.verbose);

    let output = handle_command(cli)?;
    println!("{}", output);

    Ok(())
}
