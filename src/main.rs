//! Taskchat CLI entry point.

use clap::Parser;

use taskchat::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = taskchat::cli::run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
