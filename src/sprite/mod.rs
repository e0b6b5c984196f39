//! Adapter for the external `sprite` command-line tool
//!
//! Everything seven does to a remote sandbox goes through [`SandboxCli`].
//! [`SpriteCli`] is the real implementation; tests substitute an in-memory
//! fake.

pub mod error;
pub mod inventory;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::process::{self, Captured, OutputMode};

pub use error::{Result, SpriteError};

/// A command to run inside a sandbox via `sprite exec`.
#[derive(Clone, Default)]
pub struct ExecRequest {
    command: Vec<String>,
    env: Vec<(String, String)>,
    files: Vec<(String, String)>,
}

impl ExecRequest {
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// `sh -lc <script>` so the remote login profile (PATH for gh, etc.) applies.
    pub fn login_shell(script: impl Into<String>) -> Self {
        Self::new(["sh".to_string(), "-lc".to_string(), script.into()])
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Upload `local` to `remote` before the command runs.
    pub fn file(mut self, local: impl Into<String>, remote: impl Into<String>) -> Self {
        self.files.push((local.into(), remote.into()));
        self
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn env_keys(&self) -> impl Iterator<Item = &str> {
        self.env.iter().map(|(k, _)| k.as_str())
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn files(&self) -> &[(String, String)] {
        &self.files
    }
}

// Env values can carry tokens, so only the keys are shown.
impl fmt::Debug for ExecRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecRequest")
            .field("command", &self.command)
            .field("env", &self.env_keys().collect::<Vec<_>>())
            .field("files", &self.files)
            .finish()
    }
}

/// Argument vector for `sprite exec`.
pub fn exec_args(name: &str, req: &ExecRequest) -> Vec<String> {
    let mut args = vec!["exec".to_string(), "-s".to_string(), name.to_string()];
    for (key, value) in &req.env {
        args.push("-env".to_string());
        args.push(format!("{}={}", key, value));
    }
    for (local, remote) in &req.files {
        args.push("-file".to_string());
        args.push(format!("{}:{}", local, remote));
    }
    args.extend(req.command.iter().cloned());
    args
}

pub trait SandboxCli {
    /// Interactive login; inherits the terminal.
    fn login(&self) -> Result<()>;

    /// Raw inventory listing.
    fn list(&self) -> Result<String>;

    fn exists(&self, name: &str) -> Result<bool> {
        let listing = self.list()?;
        Ok(inventory::listing_contains(&listing, name))
    }

    fn create(&self, name: &str) -> Result<()>;

    fn destroy(&self, name: &str) -> Result<()>;

    fn exec(&self, name: &str, req: &ExecRequest) -> Result<()>;

    /// Like [`SandboxCli::exec`] but always captures the combined output,
    /// returning it whether or not the remote command succeeded.
    fn exec_output(&self, name: &str, req: &ExecRequest) -> Result<Captured>;

    fn console(&self, name: &str) -> Result<()>;

    /// Output of `sprite upgrade --check`.
    fn upgrade_check(&self) -> Result<String>;

    /// `sprite upgrade`, answering its confirmation prompt.
    fn upgrade(&self) -> Result<()>;
}

/// The real `sprite` binary.
#[derive(Debug, Clone)]
pub struct SpriteCli {
    binary: PathBuf,
    quiet: bool,
}

impl SpriteCli {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            quiet: false,
        }
    }

    /// Find the binary: an explicitly configured path, then `PATH`, then
    /// `~/.local/bin/sprite` where the installer puts it.
    pub fn locate(configured: Option<&Path>) -> Result<Self> {
        if let Some(path) = configured {
            if path.is_file() {
                return Ok(Self::new(path));
            }
            tracing::warn!("Configured sprite binary {} does not exist", path.display());
        }

        if let Some(path) = process::find_binary("sprite") {
            return Ok(Self::new(path));
        }

        if let Some(home) = dirs::home_dir() {
            let fallback = home.join(".local").join("bin").join("sprite");
            if fallback.is_file() {
                return Ok(Self::new(fallback));
            }
        }

        Err(SpriteError::NotInstalled)
    }

    /// Capture external output instead of streaming it to the terminal.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn run(&self, label: &str, args: &[String], mode: OutputMode) -> Result<()> {
        tracing::debug!("sprite {}", label);
        if self.quiet && mode != OutputMode::Inherit {
            let out = process::capture(&self.binary, args, &[])?;
            if !out.success {
                return Err(SpriteError::failed(format!("sprite {}", label), detail(out.text)));
            }
            return Ok(());
        }

        let status = process::run(&self.binary, args, &[], mode)?;
        if !status.success() {
            return Err(SpriteError::failed(
                format!("sprite {}", label),
                process::describe_failure(Some(status), ""),
            ));
        }
        Ok(())
    }

    fn capture(&self, label: &str, args: &[&str]) -> Result<String> {
        let out = process::capture(&self.binary, args, &[])?;
        if !out.success {
            return Err(SpriteError::failed(format!("sprite {}", label), detail(out.text)));
        }
        Ok(out.text)
    }
}

fn detail(output: String) -> String {
    if output.is_empty() {
        "non-zero exit".to_string()
    } else {
        output
    }
}

fn require_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SpriteError::EmptyName);
    }
    Ok(())
}

impl SandboxCli for SpriteCli {
    fn login(&self) -> Result<()> {
        self.run("login", &["login".to_string()], OutputMode::Inherit)
    }

    fn list(&self) -> Result<String> {
        self.capture("list", &["list"])
    }

    fn create(&self, name: &str) -> Result<()> {
        require_name(name)?;
        let args = vec![
            "create".to_string(),
            "--skip-console".to_string(),
            name.to_string(),
        ];
        self.run("create", &args, OutputMode::NoInput)
    }

    fn destroy(&self, name: &str) -> Result<()> {
        require_name(name)?;
        let args = vec![
            "destroy".to_string(),
            "--force".to_string(),
            name.to_string(),
        ];
        self.run("destroy", &args, OutputMode::NoInput)
    }

    fn exec(&self, name: &str, req: &ExecRequest) -> Result<()> {
        require_name(name)?;
        let label = format!("exec {}", req.command().first().map_or("", String::as_str));
        let args = exec_args(name, req);
        if self.quiet {
            self.run(&label, &args, OutputMode::Quiet)
        } else {
            // Remote commands may prompt (e.g. host key confirmation on clone).
            self.run(&label, &args, OutputMode::Inherit)
        }
    }

    fn exec_output(&self, name: &str, req: &ExecRequest) -> Result<Captured> {
        require_name(name)?;
        tracing::debug!("sprite exec (captured) {:?}", req);
        Ok(process::capture(&self.binary, &exec_args(name, req), &[])?)
    }

    fn console(&self, name: &str) -> Result<()> {
        require_name(name)?;
        let args = vec!["console".to_string(), "-s".to_string(), name.to_string()];
        self.run("console", &args, OutputMode::Inherit)
    }

    fn upgrade_check(&self) -> Result<String> {
        self.capture("upgrade --check", &["upgrade", "--check"])
    }

    fn upgrade(&self) -> Result<()> {
        let status = process::run_with_input(&self.binary, &["upgrade"], b"y\n", self.quiet)?;
        if !status.success() {
            return Err(SpriteError::failed(
                "sprite upgrade",
                process::describe_failure(Some(status), ""),
            ));
        }
        Ok(())
    }
}


#[cfg(all(test, unix))]
mod unix_tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_sprite(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("sprite");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_list_failure_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = SpriteCli::new(fake_sprite(dir.path(), "echo 'not logged in' >&2; exit 1"));
        let err = cli.list().unwrap_err();
        assert!(err.to_string().contains("not logged in"));
    }

    #[test]
    fn test_exists_uses_listing() {
        let dir = tempfile::tempdir().unwrap();
        let cli = SpriteCli::new(fake_sprite(dir.path(), "printf 'NAME\\nmy-app-2\\n'"));
        assert!(!cli.exists("my-app").unwrap());
        assert!(cli.exists("my-app-2").unwrap());
    }

    #[test]
    fn test_upgrade_answers_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("answer");
        let body = format!("read answer; printf %s \"$answer\" > '{}'", log.display());
        let cli = SpriteCli::new(fake_sprite(dir.path(), &body)).quiet(true);
        cli.upgrade().unwrap();
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "y");
    }

    #[test]
    fn test_quiet_exec_reports_output_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let cli = SpriteCli::new(fake_sprite(dir.path(), "echo 'clone denied'; exit 2")).quiet(true);
        let err = cli
            .exec("app", &ExecRequest::new(["git", "clone", "x", "app"]))
            .unwrap_err();
        assert!(err.to_string().contains("clone denied"));
    }
}
