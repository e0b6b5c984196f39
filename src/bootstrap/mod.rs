//! One-shot assistant launch on the first interactive console
//!
//! Creation installs a small hook sourced from the sandbox user's shell rc
//! files and arms a marker file. The first interactive shell that sources the
//! hook consumes the marker, changes into the cloned repository and replaces
//! itself with the assistant. Later shells find no marker and do nothing.

use crate::error::Result;
use crate::progress::ProgressSink;
use crate::sprite::{ExecRequest, SandboxCli};

pub const HOOK_FILE: &str = ".seven-console-hook.sh";
pub const ONCE_MARKER: &str = ".seven-console-once";
pub const RECORD_FILE: &str = ".seven-console-last";

const RC_FILES: &[&str] = &[".bashrc", ".zshrc"];

/// The line appended to each rc file.
pub fn source_line() -> String {
    format!(r#"[ -f "$HOME/{hook}" ] && . "$HOME/{hook}""#, hook = HOOK_FILE)
}

/// Contents of `$HOME/.seven-console-hook.sh`.
pub fn hook_script() -> String {
    format!(
        r#"# Installed by seven. Launches the assistant once, in the first interactive shell.
case "$-" in
  *i*) ;;
  *) return 0 2>/dev/null || exit 0 ;;
esac
seven_once="$HOME/{once}"
if [ -f "$seven_once" ]; then
  seven_repo=""
  seven_assistant=""
  {{ IFS= read -r seven_repo; IFS= read -r seven_assistant; }} < "$seven_once"
  rm -f "$seven_once"
  if [ -n "$seven_repo" ] && [ -d "$seven_repo" ]; then
    cd "$seven_repo" || true
  fi
  printf '%s\n%s\n' "$seven_repo" "$seven_assistant" > "$HOME/{record}"
  if [ -n "$seven_assistant" ]; then
    eval "exec $seven_assistant"
  fi
fi
unset seven_once seven_repo seven_assistant
"#,
        once = ONCE_MARKER,
        record = RECORD_FILE,
    )
}

/// Remote installer. Reads the hook body, repository directory and
/// assistant command from `SEVEN_HOOK_SCRIPT`, `SEVEN_REPO_DIR` and
/// `SEVEN_ASSISTANT`.
pub fn install_script() -> String {
    let mut script = String::new();
    script.push_str("set -e\n");
    script.push_str(&format!(
        "printf '%s\\n' \"$SEVEN_HOOK_SCRIPT\" > \"$HOME/{}\"\n",
        HOOK_FILE
    ));
    script.push_str(&format!("line='{}'\n", source_line()));
    for rc in RC_FILES {
        script.push_str(&format!(
            "touch \"$HOME/{rc}\"\n\
             grep -Fqx \"$line\" \"$HOME/{rc}\" || printf '\\n%s\\n' \"$line\" >> \"$HOME/{rc}\"\n",
            rc = rc
        ));
    }
    script.push_str(&format!(
        "printf '%s\\n%s\\n' \"$HOME/$SEVEN_REPO_DIR\" \"$SEVEN_ASSISTANT\" > \"$HOME/{}\"\n",
        ONCE_MARKER
    ));
    script
}

pub fn install_request(repo_dir: &str, assistant: &str) -> ExecRequest {
    ExecRequest::new(["sh".to_string(), "-c".to_string(), install_script()])
        .env("SEVEN_HOOK_SCRIPT", hook_script())
        .env("SEVEN_REPO_DIR", repo_dir)
        .env("SEVEN_ASSISTANT", assistant)
}

/// Install the hook and arm the marker for `~/<repo_dir>`.
pub fn install<S: SandboxCli + ?Sized>(
    cli: &S,
    sandbox: &str,
    repo_dir: &str,
    assistant: &str,
    log: &dyn ProgressSink,
    prefix: &str,
) -> Result<()> {
    log.log(&format!(
        "{} arming {} for the first console session",
        prefix, assistant
    ));
    cli.exec(sandbox, &install_request(repo_dir, assistant))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_line() {
        assert_eq!(
            source_line(),
            r#"[ -f "$HOME/.seven-console-hook.sh" ] && . "$HOME/.seven-console-hook.sh""#
        );
    }

    #[test]
    fn test_hook_deletes_marker_before_exec() {
        let hook = hook_script();
        let rm = hook.find("rm -f \"$seven_once\"").unwrap();
        let exec = hook.find("eval \"exec").unwrap();
        assert!(rm < exec);
    }

    #[test]
    fn test_install_request_env() {
        let req = install_request("demo", "codex");
        assert_eq!(req.env_value("SEVEN_REPO_DIR"), Some("demo"));
        assert_eq!(req.env_value("SEVEN_ASSISTANT"), Some("codex"));
        assert_eq!(req.env_value("SEVEN_HOOK_SCRIPT"), Some(hook_script().as_str()));
        assert_eq!(req.command()[0], "sh");
    }
}

#[cfg(all(test, unix))]
mod shell_tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use std::process::Command;

    fn run_install(home: &Path, repo_dir: &str, assistant: &str) {
        let status = Command::new("sh")
            .args(["-c", &install_script()])
            .env("HOME", home)
            .env("SEVEN_HOOK_SCRIPT", hook_script())
            .env("SEVEN_REPO_DIR", repo_dir)
            .env("SEVEN_ASSISTANT", assistant)
            .status()
            .unwrap();
        assert!(status.success());
    }

    fn stub_assistant(bin: &Path) {
        fs::create_dir_all(bin).unwrap();
        let path = bin.join("stub-assistant");
        fs::write(&path, "#!/bin/sh\npwd > \"$HOME/ran\"\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn source_interactively(home: &Path, bin: &Path) -> String {
        let path = format!(
            "{}:{}",
            bin.display(),
            std::env::var("PATH").unwrap_or_default()
        );
        let out = Command::new("bash")
            .args([
                "--norc",
                "--noprofile",
                "-i",
                "-c",
                ". \"$HOME/.seven-console-hook.sh\"; echo fallthrough",
            ])
            .env("HOME", home)
            .env("PATH", path)
            .output()
            .unwrap();
        String::from_utf8_lossy(&out.stdout).into_owned()
    }

    #[test]
    fn test_install_is_idempotent_for_rc_files() {
        let home = tempfile::tempdir().unwrap();
        run_install(home.path(), "demo", "codex");
        run_install(home.path(), "demo", "codex");

        for rc in RC_FILES {
            let content = fs::read_to_string(home.path().join(rc)).unwrap();
            let count = content.lines().filter(|l| *l == source_line()).count();
            assert_eq!(count, 1, "{} should source the hook exactly once", rc);
        }

        let marker = fs::read_to_string(home.path().join(ONCE_MARKER)).unwrap();
        assert_eq!(
            marker,
            format!("{}/demo\ncodex\n", home.path().display())
        );
    }

    #[test]
    fn test_hook_fires_once() {
        if which::which("bash").is_err() {
            return;
        }
        let home = tempfile::tempdir().unwrap();
        let bin = home.path().join("bin");
        stub_assistant(&bin);
        fs::create_dir(home.path().join("demo")).unwrap();
        run_install(home.path(), "demo", "stub-assistant");

        let first = source_interactively(home.path(), &bin);
        assert!(!first.contains("fallthrough"));
        let ran_in = fs::read_to_string(home.path().join("ran")).unwrap();
        assert!(ran_in.trim().ends_with("/demo"));
        assert!(!home.path().join(ONCE_MARKER).exists());
        let record = fs::read_to_string(home.path().join(RECORD_FILE)).unwrap();
        assert!(record.ends_with("stub-assistant\n"));

        fs::remove_file(home.path().join("ran")).unwrap();
        let second = source_interactively(home.path(), &bin);
        assert!(second.contains("fallthrough"));
        assert!(!home.path().join("ran").exists());
    }

    #[test]
    fn test_non_interactive_shell_leaves_marker_armed() {
        let home = tempfile::tempdir().unwrap();
        run_install(home.path(), "demo", "codex");

        let out = Command::new("sh")
            .args(["-c", ". \"$HOME/.seven-console-hook.sh\"; echo after"])
            .env("HOME", home.path())
            .output()
            .unwrap();
        assert!(String::from_utf8_lossy(&out.stdout).contains("after"));
        assert!(home.path().join(ONCE_MARKER).exists());
    }
}
