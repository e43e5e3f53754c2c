use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use logroute::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    init_tracing();

    let config_path = args.config_path();
    match args.get_command() {
        cli::Commands::Serve => commands::serve::execute(&config_path).await?,
        cli::Commands::Check => commands::check::execute(&config_path)?,
        cli::Commands::Version => {
            println!("logroute v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
