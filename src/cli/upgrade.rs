//! `seven upgrade` command implementation

use anyhow::Result;
use clap::Args;

use super::Env;
use crate::error::SevenError;
use crate::progress::PrintSink;
use crate::upgrade::{self, UpgradeOutcome};

#[derive(Args)]
pub struct UpgradeArgs {
    /// Only report whether a newer sprite CLI exists
    #[arg(long)]
    pub check: bool,
}

pub async fn run(args: UpgradeArgs) -> Result<()> {
    let env = Env::load()?;
    let cli = env.sprite()?;

    match upgrade::run(&cli, !args.check, &PrintSink::plain()) {
        Ok(UpgradeOutcome::UpToDate(check)) => {
            println!("sprite is up to date ({})", check.current);
        }
        Ok(UpgradeOutcome::Available(check)) => {
            println!(
                "sprite upgrade available: {} -> {} (run: seven upgrade)",
                check.current, check.latest
            );
        }
        Ok(UpgradeOutcome::Upgraded(check)) => {
            println!("upgraded sprite to {}", check.latest);
        }
        Err(SevenError::UpgradeCheckUnparsable) => {
            eprintln!("could not determine the sprite version; skipping upgrade");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
