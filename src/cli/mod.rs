//! Command-line interface.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config_path).await,
        Commands::Migrate => commands::migrate::execute(config_path, cli.json).await,
        Commands::Config => commands::config::execute(config_path, cli.json),
    }
}
