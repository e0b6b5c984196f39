//! CLI command implementations

pub mod definition;
pub mod destroy;
pub mod init;
pub mod status;
pub mod up;
pub mod upgrade;

pub use definition::{Cli, Commands};

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::SevenError;
use crate::identity;
use crate::sprite::SpriteCli;

/// Per-invocation context shared by the commands.
pub struct Env {
    pub config: Config,
    pub cwd: PathBuf,
}

impl Env {
    pub fn load() -> Result<Self> {
        let config = Config::load().context("failed to load config.toml")?;
        let cwd = std::env::current_dir().context("failed to read the current directory")?;
        Ok(Self { config, cwd })
    }

    /// Fail on an unusable sandbox name before anything else is checked.
    pub fn require_identity(&self) -> Result<()> {
        identity::resolve(&self.cwd).map_err(SevenError::from)?;
        Ok(())
    }

    /// Locate the `sprite` binary; its absence is fatal.
    pub fn sprite(&self) -> Result<SpriteCli> {
        let configured = self.config.sprite_binary();
        let cli = SpriteCli::locate(configured.as_deref()).map_err(SevenError::from)?;
        tracing::debug!("using sprite binary {}", cli.binary().display());
        Ok(cli)
    }
}
