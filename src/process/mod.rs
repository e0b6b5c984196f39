//! Process utilities for driving external command-line tools
//!
//! Every remote effect in seven goes through an external binary (`sprite`,
//! `git`, `gh`). These helpers keep the stdio wiring in one place.

use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

/// How the child's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Inherit stdin, stdout and stderr (interactive commands).
    Inherit,
    /// Inherit stdout/stderr but read stdin from /dev/null so the child
    /// cannot block on a prompt.
    NoInput,
    /// Discard everything.
    Quiet,
}

/// Combined, trimmed output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub success: bool,
    pub text: String,
}

impl Captured {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
        }
    }
}

fn command<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    env: &[(String, String)],
) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd
}

/// Run a command to completion with the given stdio wiring.
pub fn run<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    env: &[(String, String)],
    mode: OutputMode,
) -> io::Result<ExitStatus> {
    let mut cmd = command(program, args, env);
    match mode {
        OutputMode::Inherit => {}
        OutputMode::NoInput => {
            cmd.stdin(Stdio::null());
        }
        OutputMode::Quiet => {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }
    }
    cmd.status()
}

/// Run a command and capture stdout followed by stderr.
pub fn capture<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    env: &[(String, String)],
) -> io::Result<Captured> {
    let output = command(program, args, env)
        .stdin(Stdio::null())
        .output()?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }

    Ok(Captured {
        success: output.status.success(),
        text: text.trim().to_string(),
    })
}

/// Run a command, feeding `input` on its stdin. Output is inherited unless
/// `quiet` is set.
pub fn run_with_input<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    input: &[u8],
    quiet: bool,
) -> io::Result<ExitStatus> {
    let mut cmd = command(program, args, &[]);
    cmd.stdin(Stdio::piped());
    if quiet {
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
    }

    let mut child = cmd.spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        // The child may exit without reading; a broken pipe is not our failure.
        match stdin.write_all(input) {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
            _ => {}
        }
    }
    child.wait()
}

/// Locate a binary on PATH.
pub fn find_binary(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

pub fn is_available(name: &str) -> bool {
    find_binary(name).is_some()
}

/// Short human description of a failed exit status plus any output.
pub fn describe_failure(status: Option<ExitStatus>, output: &str) -> String {
    let status = match status.and_then(|s| s.code()) {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    };
    let output = output.trim();
    if output.is_empty() {
        status
    } else {
        format!("{} ({})", status, output)
    }
}
