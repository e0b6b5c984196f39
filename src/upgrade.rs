//! Keeping the `sprite` CLI itself up to date

use crate::error::{Result, SevenError};
use crate::progress::ProgressSink;
use crate::sprite::SandboxCli;

const LATEST_PREFIX: &str = "Latest version:";
const CURRENT_PREFIX: &str = "Current version:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeCheck {
    pub latest: String,
    pub current: String,
}

impl UpgradeCheck {
    pub fn available(&self) -> bool {
        self.latest != self.current
    }
}

fn field<'a>(output: &'a str, prefix: &str) -> Option<&'a str> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix(prefix))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Parse `sprite upgrade --check` output. `None` when either version line is
/// missing or empty; that is "cannot decide", not "up to date".
pub fn parse_check_output(output: &str) -> Option<UpgradeCheck> {
    Some(UpgradeCheck {
        latest: field(output, LATEST_PREFIX)?.to_string(),
        current: field(output, CURRENT_PREFIX)?.to_string(),
    })
}

pub fn check_for_upgrade<S: SandboxCli + ?Sized>(cli: &S) -> Result<Option<UpgradeCheck>> {
    let output = cli.upgrade_check()?;
    let check = parse_check_output(&output);
    if check.is_none() {
        tracing::debug!("Unrecognised upgrade check output: {}", output);
    }
    Ok(check)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    UpToDate(UpgradeCheck),
    Available(UpgradeCheck),
    Upgraded(UpgradeCheck),
}

/// Check, and when `apply` is set and a different version exists, upgrade.
pub fn run<S: SandboxCli + ?Sized>(
    cli: &S,
    apply: bool,
    log: &dyn ProgressSink,
) -> Result<UpgradeOutcome> {
    let check = check_for_upgrade(cli)?.ok_or(SevenError::UpgradeCheckUnparsable)?;
    if !check.available() {
        return Ok(UpgradeOutcome::UpToDate(check));
    }
    if !apply {
        return Ok(UpgradeOutcome::Available(check));
    }

    log.log(&format!(
        "[seven upgrade] upgrading sprite from {} to {}",
        check.current, check.latest
    ));
    cli.upgrade()?;
    Ok(UpgradeOutcome::Upgraded(check))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_both_lines() {
        let check = parse_check_output("Latest version: v0.0.2\nCurrent version: v0.0.1\n").unwrap();
        assert_eq!(check.latest, "v0.0.2");
        assert_eq!(check.current, "v0.0.1");
        assert!(check.available());
    }

    #[test]
    fn test_parse_same_version() {
        let check =
            parse_check_output("Checking...\n  Current version: v1.2.0\n  Latest version: v1.2.0")
                .unwrap();
        assert!(!check.available());
    }

    #[test]
    fn test_parse_missing_line_is_undecidable() {
        assert_eq!(parse_check_output("no version lines"), None);
        assert_eq!(parse_check_output("Latest version: v1\n"), None);
        assert_eq!(parse_check_output("Latest version:\nCurrent version: v1"), None);
    }
}
