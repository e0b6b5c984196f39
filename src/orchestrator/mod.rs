//! Reconciliation of a working directory with its remote sandbox
//!
//! `init` and `up` drive the sandbox towards "exists, repository cloned,
//! credentials mirrored, assistant armed"; `destroy` and `status` are the
//! inverse and the read-only view. Every step is safe to repeat: re-running
//! a failed command is the recovery mechanism.

use std::cell::Cell;
use std::fmt;
use std::path::PathBuf;

use crate::bootstrap;
use crate::config::Config;
use crate::credentials::{self, CredentialBundle, GitIdentity};
use crate::error::{Result, SevenError};
use crate::host::HostTools;
use crate::identity::{self, marker, NameInfo, SandboxName};
use crate::progress::ProgressSink;
use crate::repo;
use crate::sprite::{inventory, SandboxCli, SpriteError};

const INIT: &str = "[seven init]";
const UP: &str = "[seven up]";

/// The parts of the user configuration the engine needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub gh_host: String,
    pub assistant_command: String,
    pub remote_home: String,
    /// Where to find assistant auth files; `None` disables the upload.
    pub assistant_auth_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            gh_host: config.github.host.clone(),
            assistant_command: config.assistant.command.clone(),
            remote_home: config.sprite.remote_home.clone(),
            assistant_auth_dir: if config.assistant.sync_auth {
                config.assistant_auth_dir()
            } else {
                None
            },
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpOptions {
    pub assume_logged_in: bool,
    pub open_console: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpOutcome {
    pub name: SandboxName,
    pub open_console: bool,
    /// The sandbox was already there; nothing was created.
    pub existed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyOutcome {
    Destroyed(SandboxName),
    NotFound(SandboxName),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub info: NameInfo,
    pub exists: bool,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sprite: {} (from {})", self.info.name, self.info.origin())?;
        write!(
            f,
            "status: {}",
            if self.exists { "exists" } else { "missing" }
        )
    }
}

fn inventory_error(err: SpriteError) -> SevenError {
    match err {
        SpriteError::NotInstalled => SevenError::ToolUnavailable,
        other => SevenError::InventoryQueryFailed(other),
    }
}

pub struct Orchestrator<'a, S: ?Sized, H: ?Sized> {
    cli: &'a S,
    host: &'a H,
    cwd: PathBuf,
    settings: Settings,
    log: &'a dyn ProgressSink,
    /// Login is handled outside this run; never prompt from here.
    login_handled: bool,
    /// The one login-and-retry for a failed inventory query is spent.
    retried: Cell<bool>,
}

impl<'a, S, H> Orchestrator<'a, S, H>
where
    S: SandboxCli + ?Sized,
    H: HostTools + ?Sized,
{
    pub fn new(
        cli: &'a S,
        host: &'a H,
        cwd: impl Into<PathBuf>,
        settings: Settings,
        log: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            cli,
            host,
            cwd: cwd.into(),
            settings,
            log,
            login_handled: false,
            retried: Cell::new(false),
        }
    }

    /// A login already happened (or was deliberately skipped) before this
    /// run, so a failing inventory query is not answered with another one.
    pub fn with_login_attempted(mut self) -> Self {
        self.login_handled = true;
        self
    }

    fn say(&self, prefix: &str, msg: impl AsRef<str>) {
        self.log.log(&format!("{} {}", prefix, msg.as_ref()));
    }

    fn login(&self, prefix: &str) -> Result<()> {
        self.say(prefix, "logging in to sprite");
        self.cli.login()?;
        Ok(())
    }

    fn resolve(&self, prefix: &str) -> Result<NameInfo> {
        let info = identity::resolve(&self.cwd)?;
        if info.normalized && !info.from_file {
            self.say(
                prefix,
                format!(
                    "normalized sprite name from {:?} to {:?} (set .sprite to override)",
                    info.original,
                    info.name.as_str()
                ),
            );
        }
        self.say(prefix, format!("using sprite name: {}", info.name));
        Ok(info)
    }

    /// Existence query that answers the first failure of the run with a
    /// login and a single retry.
    fn exists_with_login_retry(&self, name: &SandboxName) -> Result<bool> {
        match self.cli.exists(name.as_str()) {
            Ok(exists) => Ok(exists),
            Err(SpriteError::NotInstalled) => Err(SevenError::ToolUnavailable),
            Err(first) if self.login_handled || self.retried.get() => {
                Err(SevenError::InventoryQueryFailed(first))
            }
            Err(first) => {
                tracing::debug!("sprite list failed, retrying after login: {}", first);
                self.retried.set(true);
                self.say(INIT, "sprite list failed; logging in and retrying");
                self.login(INIT)?;
                self.cli
                    .exists(name.as_str())
                    .map_err(inventory_error)
            }
        }
    }

    fn write_marker_if_derived(&self, info: &NameInfo) -> Result<()> {
        if !info.from_file {
            marker::write(&self.cwd, info.name.as_str())?;
        }
        Ok(())
    }

    /// One-time setup: log in, then create or reuse the sandbox.
    pub fn init(&self, opts: UpOptions) -> Result<UpOutcome> {
        if !opts.assume_logged_in {
            self.login(INIT)?;
        }
        let info = self.resolve(INIT)?;
        self.init_resolved(&info)
    }

    fn init_resolved(&self, info: &NameInfo) -> Result<UpOutcome> {
        let name = &info.name;

        if self.exists_with_login_retry(name)? {
            self.say(INIT, "sprite exists");
            self.write_marker_if_derived(info)?;
            let identity = GitIdentity::read(self.host);
            credentials::sync_git_identity(self.cli, name.as_str(), &identity, self.log, INIT)?;
            return Ok(UpOutcome {
                name: name.clone(),
                open_console: false,
                existed: true,
            });
        }

        self.create(name)?;
        Ok(UpOutcome {
            name: name.clone(),
            open_console: false,
            existed: false,
        })
    }

    fn create(&self, name: &SandboxName) -> Result<()> {
        let sandbox = name.as_str();

        self.say(INIT, "creating sprite");
        self.cli.create(sandbox)?;

        self.say(INIT, "writing .sprite");
        marker::write(&self.cwd, sandbox)?;

        let identity = GitIdentity::read(self.host);
        credentials::sync_git_identity(self.cli, sandbox, &identity, self.log, INIT)?;

        let plan = repo::plan(
            self.host,
            &self.cwd,
            &self.settings.gh_host,
            self.log,
            INIT,
        )?;
        let bundle = CredentialBundle {
            identity,
            token: plan.token.clone(),
            artifacts: credentials::assistant_artifacts(
                self.settings.assistant_auth_dir.as_deref(),
                &self.settings.remote_home,
            ),
        };

        if let Err(e) = credentials::ensure_hosted_auth(
            self.cli,
            sandbox,
            bundle.token.as_ref(),
            &self.settings.gh_host,
            self.log,
            INIT,
        ) {
            self.say(INIT, format!("gh auth setup failed: {}", e));
        }

        repo::execute(self.cli, sandbox, &plan, self.log, INIT)?;

        if let Err(e) =
            credentials::sync_assistant_auth(self.cli, sandbox, &bundle.artifacts, self.log, INIT)
        {
            self.say(INIT, format!("assistant auth sync failed: {}", e));
        }

        // Without a clone the hook skips the `cd` and starts in $HOME.
        bootstrap::install(
            self.cli,
            sandbox,
            sandbox,
            &self.settings.assistant_command,
            self.log,
            INIT,
        )?;
        Ok(())
    }

    /// Bring the sandbox up, creating it only when it is missing. An
    /// existing sandbox is reused without logging in.
    pub fn up(&self, opts: UpOptions) -> Result<UpOutcome> {
        let info = self.resolve(UP)?;

        let query_failed = match self.cli.exists(info.name.as_str()) {
            Ok(true) => {
                self.say(UP, "sprite exists");
                self.write_marker_if_derived(&info)?;
                return Ok(UpOutcome {
                    name: info.name,
                    open_console: opts.open_console,
                    existed: true,
                });
            }
            Ok(false) => false,
            Err(SpriteError::NotInstalled) => return Err(SevenError::ToolUnavailable),
            Err(e) => {
                tracing::debug!("initial sprite list failed: {}", e);
                self.say(UP, "sprite list failed; running init");
                true
            }
        };

        if !opts.assume_logged_in && !self.login_handled {
            // This login answers the failed query, so it is the one retry.
            if query_failed {
                self.retried.set(true);
            }
            self.login(INIT)?;
        }
        let mut outcome = self.init_resolved(&info)?;
        outcome.open_console = opts.open_console;
        Ok(outcome)
    }

    /// Destroy the sandbox, then forget it locally. The marker only goes
    /// once the sandbox is confirmed gone.
    pub fn destroy(&self) -> Result<DestroyOutcome> {
        let info = identity::resolve(&self.cwd)?;
        let name = info.name;

        let listing = self.cli.list().map_err(inventory_error)?;
        let exists = inventory::listing_contains(&listing, name.as_str());

        if exists {
            self.cli
                .destroy(name.as_str())
                .map_err(SevenError::DestroyFailed)?;
        }

        if marker::remove(&self.cwd)? {
            tracing::debug!("removed {}", marker::path(&self.cwd).display());
        }

        Ok(if exists {
            DestroyOutcome::Destroyed(name)
        } else {
            DestroyOutcome::NotFound(name)
        })
    }

    pub fn status(&self) -> Result<StatusReport> {
        let info = identity::resolve(&self.cwd)?;
        let exists = self
            .cli
            .exists(info.name.as_str())
            .map_err(inventory_error)?;
        Ok(StatusReport { info, exists })
    }
}
