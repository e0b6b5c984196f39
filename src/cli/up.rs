//! `seven up` command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::io::IsTerminal;
use std::path::PathBuf;

use super::Env;
use crate::error::SevenError;
use crate::host::SystemHost;
use crate::orchestrator::{Orchestrator, Settings, UpOptions, UpOutcome};
use crate::progress::{self, PrintSink, ProgressSink};
use crate::sprite::{SandboxCli, SpriteCli};
use crate::upgrade::{self, UpgradeOutcome};

#[derive(Args)]
pub struct UpArgs {
    /// Skip `sprite login`
    #[arg(long)]
    pub assume_logged_in: bool,

    /// Do not open the sprite console afterwards
    #[arg(long)]
    pub no_console: bool,

    /// Print plain log lines instead of the live progress view
    #[arg(long)]
    pub no_tui: bool,
}

pub async fn run(args: UpArgs) -> Result<()> {
    let env = Env::load()?;
    let cli = env.sprite()?;
    let settings = Settings::from_config(&env.config);
    let opts = UpOptions {
        assume_logged_in: args.assume_logged_in,
        open_console: !args.no_console,
    };

    if env.config.updates.check_on_up {
        upgrade_before_up(&cli);
    }

    let interactive = !args.no_tui && std::io::stdout().is_terminal();
    let result = if interactive {
        run_interactive(cli.clone(), env.cwd.clone(), settings, opts).await
    } else {
        let sink = PrintSink::plain();
        Orchestrator::new(&cli, &SystemHost, env.cwd.clone(), settings, &sink).up(opts)
    };
    let outcome = result.context("seven up failed")?;

    if outcome.open_console {
        let sink = if interactive {
            PrintSink::styled()
        } else {
            PrintSink::plain()
        };
        sink.log(&format!("[seven up] opening console: {}", outcome.name));
        cli.console(outcome.name.as_str())
            .map_err(SevenError::from)
            .context("failed to open console")?;
    }
    Ok(())
}

/// The live view cannot host an interactive login, so any login happens in
/// the foreground first and the worker never attempts one.
async fn run_interactive(
    cli: SpriteCli,
    cwd: PathBuf,
    settings: Settings,
    mut opts: UpOptions,
) -> crate::error::Result<UpOutcome> {
    if !opts.assume_logged_in {
        if let Err(e) = cli.list() {
            tracing::debug!("pre-flight sprite list failed: {}", e);
            PrintSink::styled().log("[seven init] logging in to sprite");
            cli.login()?;
        }
        opts.assume_logged_in = true;
    }

    let quiet = cli.quiet(true);
    progress::run_with_progress("seven up", move |log| {
        Orchestrator::new(&quiet, &SystemHost, cwd, settings, log)
            .with_login_attempted()
            .up(opts)
    })
    .await
}

fn upgrade_before_up(cli: &SpriteCli) {
    match upgrade::run(cli, true, &PrintSink::plain()) {
        Ok(UpgradeOutcome::Upgraded(check)) => println!("upgraded sprite to {}", check.latest),
        Ok(_) => {}
        Err(SevenError::UpgradeCheckUnparsable) => {
            tracing::debug!("sprite upgrade check output not recognised; skipping upgrade");
        }
        Err(e) => eprintln!("sprite upgrade check failed: {}", e),
    }
}
