//! Mirroring host credentials and git identity into a sandbox
//!
//! Nothing here persists anything locally. Tokens are held in [`GhToken`],
//! whose `Debug` output is redacted, and are only ever handed to the remote
//! side through `-env` so they never appear in a remote command line.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, SevenError};
use crate::host::{self, HostTools};
use crate::progress::ProgressSink;
use crate::sprite::{ExecRequest, SandboxCli};

/// Files under the assistant's auth directory that carry a login session.
pub const ASSISTANT_AUTH_FILES: &[&str] = &["auth.json", "config.toml"];

/// Host git `user.name` / `user.email`. Empty strings mean unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

impl GitIdentity {
    /// Read from the host. Missing `git` or unset keys give empty values.
    pub fn read<H: HostTools + ?Sized>(host: &H) -> Self {
        if !host.has_binary("git") {
            return Self::default();
        }
        let get = |key: &str| {
            host::output_if_success(host, "git", &["config", "--get", key]).unwrap_or_default()
        };
        Self {
            name: get("user.name"),
            email: get("user.email"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty()
    }
}

/// A GitHub CLI token.
#[derive(Clone, PartialEq, Eq)]
pub struct GhToken(String);

impl GhToken {
    /// `None` for an empty or whitespace-only token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Read with `gh auth token` when `gh` is installed on the host.
    pub fn from_host<H: HostTools + ?Sized>(host: &H) -> Option<Self> {
        if !host.has_binary("gh") {
            return None;
        }
        host::output_if_success(host, "gh", &["auth", "token"]).and_then(Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for GhToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GhToken(<redacted>)")
    }
}

/// A local assistant auth file and where it goes in the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthArtifact {
    pub local: PathBuf,
    pub remote: String,
}

/// Everything mirrored into a freshly created sandbox.
#[derive(Debug, Clone, Default)]
pub struct CredentialBundle {
    pub identity: GitIdentity,
    pub token: Option<GhToken>,
    pub artifacts: Vec<AuthArtifact>,
}

/// Assistant auth files present under `auth_dir`, mapped to
/// `<remote_home>/.codex/<file>`. Missing files are skipped.
pub fn assistant_artifacts(auth_dir: Option<&Path>, remote_home: &str) -> Vec<AuthArtifact> {
    let Some(dir) = auth_dir else {
        return Vec::new();
    };
    let remote_home = remote_home.trim_end_matches('/');
    ASSISTANT_AUTH_FILES
        .iter()
        .map(|file| (dir.join(file), *file))
        .filter(|(local, _)| local.is_file())
        .map(|(local, file)| AuthArtifact {
            local,
            remote: format!("{}/.codex/{}", remote_home, file),
        })
        .collect()
}

/// Set the sandbox's global git identity to the host's.
pub fn sync_git_identity<S: SandboxCli + ?Sized>(
    cli: &S,
    sandbox: &str,
    identity: &GitIdentity,
    log: &dyn ProgressSink,
    prefix: &str,
) -> Result<()> {
    if identity.is_empty() {
        return Ok(());
    }

    log.log(&format!("{} syncing git identity into sprite", prefix));
    for (key, value) in [("user.name", &identity.name), ("user.email", &identity.email)] {
        if value.is_empty() {
            continue;
        }
        let req = ExecRequest::new(["git", "config", "--global", key, value.as_str()]);
        cli.exec(sandbox, &req)?;
    }
    Ok(())
}

fn login_script(gh_host: &str) -> String {
    format!(
        "token=\"$GH_TOKEN\"; unset GH_TOKEN; printf '%s' \"$token\" | gh auth login --with-token -h {}",
        gh_host
    )
}

fn with_output(detail: String, output: &str) -> String {
    let output = output.trim();
    if output.is_empty() {
        detail
    } else {
        format!("{} ({})", detail, output)
    }
}

/// Log `gh` in inside the sandbox with the host token and wire it up as the
/// git credential helper. A missing token is a no-op.
pub fn ensure_hosted_auth<S: SandboxCli + ?Sized>(
    cli: &S,
    sandbox: &str,
    token: Option<&GhToken>,
    gh_host: &str,
    log: &dyn ProgressSink,
    prefix: &str,
) -> Result<()> {
    let Some(token) = token else {
        return Ok(());
    };

    log.log(&format!("{} configuring gh auth inside sprite", prefix));

    let probe = cli.exec_output(
        sandbox,
        &ExecRequest::login_shell("command -v gh >/dev/null 2>&1"),
    )?;
    if !probe.success {
        return Err(SevenError::AuthLoginFailed(with_output(
            "gh not found in sprite".to_string(),
            &probe.text,
        )));
    }

    let login = ExecRequest::login_shell(login_script(gh_host)).env("GH_TOKEN", token.expose());
    let out = cli.exec_output(sandbox, &login)?;
    if !out.success {
        return Err(SevenError::AuthLoginFailed(with_output(
            "non-zero exit".to_string(),
            &out.text,
        )));
    }

    let setup = ExecRequest::new(["gh", "auth", "setup-git"]).env("GH_TOKEN", token.expose());
    let out = cli.exec_output(sandbox, &setup)?;
    if !out.success {
        return Err(SevenError::AuthSetupFailed(with_output(
            "non-zero exit".to_string(),
            &out.text,
        )));
    }
    Ok(())
}

/// Upload the assistant's auth files. Nothing to upload means no remote call.
pub fn sync_assistant_auth<S: SandboxCli + ?Sized>(
    cli: &S,
    sandbox: &str,
    artifacts: &[AuthArtifact],
    log: &dyn ProgressSink,
    prefix: &str,
) -> Result<()> {
    if artifacts.is_empty() {
        return Ok(());
    }

    log.log(&format!("{} copying assistant auth into sprite", prefix));
    let mut req = ExecRequest::new(["true"]);
    for artifact in artifacts {
        req = req.file(artifact.local.to_string_lossy(), artifact.remote.clone());
    }
    cli.exec(sandbox, &req)?;
    Ok(())
}
