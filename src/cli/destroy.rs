//! `seven destroy` command implementation

use anyhow::Result;
use clap::Args;

use super::Env;
use crate::host::SystemHost;
use crate::orchestrator::{DestroyOutcome, Orchestrator, Settings};
use crate::progress::NullSink;

#[derive(Args)]
pub struct DestroyArgs {}

pub async fn run(_args: DestroyArgs) -> Result<()> {
    let env = Env::load()?;
    env.require_identity()?;
    let cli = env.sprite()?;
    let outcome = Orchestrator::new(
        &cli,
        &SystemHost,
        env.cwd.clone(),
        Settings::from_config(&env.config),
        &NullSink,
    )
    .destroy()?;

    match outcome {
        DestroyOutcome::Destroyed(name) => println!("destroyed sprite: {}", name),
        DestroyOutcome::NotFound(name) => println!("sprite not found: {}", name),
    }
    Ok(())
}
