//! Command-line interface definition

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use super::{destroy::DestroyArgs, init::InitArgs, status::StatusArgs, up::UpArgs, upgrade::UpgradeArgs};

#[derive(Parser)]
#[command(name = "seven")]
#[command(about = "Vagrant-style workflow backed by sprites: one remote sandbox per repository")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// One-time setup (login, create sprite, clone repo)
    Init(InitArgs),

    /// Create or reuse a sprite, bootstrap repo, open console
    Up(UpArgs),

    /// Destroy the current sprite and remove the .sprite file
    Destroy(DestroyArgs),

    /// Show sprite status for this repo
    Status(StatusArgs),

    /// Check for and install a newer sprite CLI
    Upgrade(UpgradeArgs),

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
