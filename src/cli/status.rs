//! `seven status` command implementation

use anyhow::Result;
use clap::Args;

use super::Env;
use crate::host::SystemHost;
use crate::orchestrator::{Orchestrator, Settings};
use crate::progress::NullSink;

#[derive(Args)]
pub struct StatusArgs {}

pub async fn run(_args: StatusArgs) -> Result<()> {
    let env = Env::load()?;
    env.require_identity()?;
    let cli = env.sprite()?;
    let report = Orchestrator::new(
        &cli,
        &SystemHost,
        env.cwd.clone(),
        Settings::from_config(&env.config),
        &NullSink,
    )
    .status()?;

    println!("{}", report);
    Ok(())
}
