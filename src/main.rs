//! seven - Vagrant-style workflow for remote sprite sandboxes

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use seven::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("SEVEN_DEBUG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter("seven=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => cli::init::run(args).await,
        Commands::Up(args) => cli::up::run(args).await,
        Commands::Destroy(args) => cli::destroy::run(args).await,
        Commands::Status(args) => cli::status::run(args).await,
        Commands::Upgrade(args) => cli::upgrade::run(args).await,
        Commands::Completion { shell } => {
            generate(shell, &mut Cli::command(), "seven", &mut std::io::stdout());
            Ok(())
        }
    }
}
