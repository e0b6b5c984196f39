//! Canonical sandbox name for a working directory
//!
//! A `.sprite` file in the directory wins and is used verbatim. Otherwise the
//! directory's base name is normalized into a valid sandbox name.

pub mod marker;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub use marker::MARKER_FILE;

pub const MAX_NAME_LEN: usize = 63;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").expect("valid sprite name regex")
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("sprite name is empty")]
    Empty,

    #[error("sprite name {0:?} is too long (max 63 characters)")]
    TooLong(String),

    #[error(
        "sprite name {0:?} is invalid (use lowercase letters, numbers, hyphens, \
         start/end with a letter or number)"
    )]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid sprite name in .sprite: {0}")]
    FromMarker(#[source] NameError),

    #[error(
        "invalid sprite name derived from directory {dir:?}: {source} \
         (set a valid name in .sprite to override)"
    )]
    FromDirectory {
        dir: String,
        #[source]
        source: NameError,
    },

    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A validated sandbox name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SandboxName(String);

impl SandboxName {
    pub fn parse(name: &str) -> Result<Self, NameError> {
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(NameError::TooLong(name.to_string()));
        }
        if !NAME_PATTERN.is_match(name) {
            return Err(NameError::Invalid(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SandboxName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SandboxName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The resolved name and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameInfo {
    pub name: SandboxName,
    /// Read from `.sprite` rather than derived from the directory.
    pub from_file: bool,
    /// The directory-derived name differs from the raw base name.
    pub normalized: bool,
    /// The raw marker content or directory base name.
    pub original: String,
}

impl NameInfo {
    /// `.sprite` or `cwd`, as shown by `seven status`.
    pub fn origin(&self) -> &'static str {
        if self.from_file {
            MARKER_FILE
        } else {
            "cwd"
        }
    }
}

/// Turn an arbitrary directory name into a sandbox name candidate.
///
/// Lowercases, collapses every run of characters outside `[a-z0-9]` into a
/// single hyphen and trims hyphens from both ends. The result may still be
/// empty or too long; [`SandboxName::parse`] decides.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_hyphen = false;

    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

/// Resolve the sandbox name for `cwd`. Reads `.sprite`, never writes.
pub fn resolve(cwd: &Path) -> Result<NameInfo, IdentityError> {
    let marker_content = marker::read(cwd).map_err(|source| IdentityError::Io {
        path: marker::path(cwd),
        source,
    })?;

    if let Some(content) = marker_content {
        let name = SandboxName::parse(&content).map_err(IdentityError::FromMarker)?;
        return Ok(NameInfo {
            name,
            from_file: true,
            normalized: false,
            original: content,
        });
    }

    let base = cwd
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let candidate = normalize(&base);
    let name = SandboxName::parse(&candidate).map_err(|source| IdentityError::FromDirectory {
        dir: base.clone(),
        source,
    })?;

    Ok(NameInfo {
        normalized: candidate != base,
        name,
        from_file: false,
        original: base,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn dir_named(name: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(name);
        fs::create_dir(&dir).unwrap();
        (tmp, dir)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("My Project"), "my-project");
        assert_eq!(normalize("--Foo__Bar--"), "foo-bar");
        assert_eq!(normalize("a...b"), "a-b");
        assert_eq!(normalize("already-ok"), "already-ok");
        assert_eq!(normalize("___"), "");
        assert_eq!(normalize("Ünïcode"), "n-code");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["My Project", "--x--y--", "A1_B2 C3", "", "ok"] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once);
            assert!(!once.starts_with('-') && !once.ends_with('-'));
            assert!(!once.contains("--"));
        }
    }

    #[test]
    fn test_parse_bounds() {
        assert_eq!(SandboxName::parse(""), Err(NameError::Empty));
        assert!(SandboxName::parse("a").is_ok());
        assert!(SandboxName::parse(&"a".repeat(63)).is_ok());
        assert!(matches!(
            SandboxName::parse(&"a".repeat(64)),
            Err(NameError::TooLong(_))
        ));
        assert!(matches!(
            SandboxName::parse("-lead"),
            Err(NameError::Invalid(_))
        ));
        assert!(matches!(
            SandboxName::parse("Upper"),
            Err(NameError::Invalid(_))
        ));
    }

    #[test]
    fn test_resolve_from_directory() {
        let (_tmp, dir) = dir_named("hello");
        let info = resolve(&dir).unwrap();
        assert_eq!(info.name.as_str(), "hello");
        assert!(!info.from_file);
        assert!(!info.normalized);
        assert_eq!(info.origin(), "cwd");
    }

    #[test]
    fn test_resolve_normalizes_directory() {
        let (_tmp, dir) = dir_named("My Project");
        let info = resolve(&dir).unwrap();
        assert_eq!(info.name.as_str(), "my-project");
        assert!(info.normalized);
        assert_eq!(info.original, "My Project");
    }

    #[test]
    fn test_resolve_prefers_marker_verbatim() {
        let (_tmp, dir) = dir_named("My Project");
        fs::write(dir.join(MARKER_FILE), "  custom-name \n").unwrap();
        let info = resolve(&dir).unwrap();
        assert_eq!(info.name.as_str(), "custom-name");
        assert!(info.from_file);
        assert_eq!(info.origin(), ".sprite");
    }

    #[test]
    fn test_resolve_invalid_marker_is_not_rewritten() {
        let (_tmp, dir) = dir_named("hello");
        fs::write(dir.join(MARKER_FILE), "Bad_Name\n").unwrap();
        let err = resolve(&dir).unwrap_err();
        assert!(matches!(err, IdentityError::FromMarker(NameError::Invalid(_))));
        assert!(err.to_string().contains(".sprite"));
    }

    #[test]
    fn test_resolve_blank_marker_falls_back_to_directory() {
        let (_tmp, dir) = dir_named("hello");
        fs::write(dir.join(MARKER_FILE), "   \n").unwrap();
        let info = resolve(&dir).unwrap();
        assert_eq!(info.name.as_str(), "hello");
        assert!(!info.from_file);
    }

    #[test]
    fn test_resolve_unusable_directory_suggests_marker() {
        let (_tmp, dir) = dir_named("___");
        let err = resolve(&dir).unwrap_err();
        assert!(matches!(
            err,
            IdentityError::FromDirectory {
                source: NameError::Empty,
                ..
            }
        ));
        assert!(err.to_string().contains("set a valid name in .sprite"));
    }

    #[test]
    fn test_resolve_does_not_write_marker() {
        let (_tmp, dir) = dir_named("hello");
        resolve(&dir).unwrap();
        assert!(!dir.join(MARKER_FILE).exists());
    }
}
