//! `seven init` command implementation

use anyhow::{Context, Result};
use clap::Args;

use super::Env;
use crate::host::SystemHost;
use crate::orchestrator::{Orchestrator, Settings, UpOptions};
use crate::progress::PrintSink;

#[derive(Args)]
pub struct InitArgs {
    /// Skip `sprite login`
    #[arg(long)]
    pub assume_logged_in: bool,
}

pub async fn run(args: InitArgs) -> Result<()> {
    let env = Env::load()?;
    let cli = env.sprite()?;
    let sink = PrintSink::plain();
    let orchestrator = Orchestrator::new(
        &cli,
        &SystemHost,
        env.cwd.clone(),
        Settings::from_config(&env.config),
        &sink,
    );

    orchestrator
        .init(UpOptions {
            assume_logged_in: args.assume_logged_in,
            open_console: false,
        })
        .context("seven init failed")?;
    Ok(())
}
