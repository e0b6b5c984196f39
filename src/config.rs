//! User configuration management

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Overrides the directory holding `config.toml`.
pub const CONFIG_DIR_ENV: &str = "SEVEN_CONFIG_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sprite: SpriteConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub updates: UpdatesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpriteConfig {
    /// Explicit path to the `sprite` binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,

    /// Home directory of the sandbox user, target for uploaded auth files.
    #[serde(default = "default_remote_home")]
    pub remote_home: String,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            binary: None,
            remote_home: default_remote_home(),
        }
    }
}

fn default_remote_home() -> String {
    "/home/sprite".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Command the console bootstrap execs on first login.
    #[serde(default = "default_assistant_command")]
    pub command: String,

    #[serde(default = "default_true")]
    pub sync_auth: bool,

    /// Local directory holding `auth.json` and `config.toml`; `~/.codex` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_dir: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            command: default_assistant_command(),
            sync_auth: true,
            auth_dir: None,
        }
    }
}

fn default_assistant_command() -> String {
    "codex".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "default_github_host")]
    pub host: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            host: default_github_host(),
        }
    }
}

fn default_github_host() -> String {
    "github.com".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatesConfig {
    /// Run `sprite upgrade --check` before `seven up`.
    #[serde(default)]
    pub check_on_up: bool,
}

pub fn get_app_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("could not determine the config directory"))?;
    Ok(base.join("seven"))
}

fn config_path() -> Result<PathBuf> {
    Ok(get_app_dir()?.join("config.toml"))
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn sprite_binary(&self) -> Option<PathBuf> {
        self.sprite.binary.as_deref().map(expand_home)
    }

    pub fn assistant_auth_dir(&self) -> Option<PathBuf> {
        match self.assistant.auth_dir.as_deref() {
            Some(dir) => Some(expand_home(dir)),
            None => dirs::home_dir().map(|h| h.join(".codex")),
        }
    }
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_deserialize_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sprite.remote_home, "/home/sprite");
        assert!(config.sprite.binary.is_none());
        assert_eq!(config.assistant.command, "codex");
        assert!(config.assistant.sync_auth);
        assert_eq!(config.github.host, "github.com");
        assert!(!config.updates.check_on_up);
    }

    #[test]
    fn test_config_deserialize_partial_toml() {
        let toml = r#"
            [assistant]
            command = "claude"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.assistant.command, "claude");
        assert!(config.assistant.sync_auth);
        assert_eq!(config.sprite.remote_home, "/home/sprite");
    }

    #[test]
    fn test_config_nested_sections() {
        let toml = r#"
            [sprite]
            binary = "/opt/sprite/bin/sprite"
            remote_home = "/root"

            [assistant]
            sync_auth = false
            auth_dir = "/tmp/codex"

            [github]
            host = "github.example.com"

            [updates]
            check_on_up = true
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.sprite_binary(),
            Some(PathBuf::from("/opt/sprite/bin/sprite"))
        );
        assert_eq!(config.sprite.remote_home, "/root");
        assert!(!config.assistant.sync_auth);
        assert_eq!(
            config.assistant_auth_dir(),
            Some(PathBuf::from("/tmp/codex"))
        );
        assert_eq!(config.github.host, "github.example.com");
        assert!(config.updates.check_on_up);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = Config::default();
        config.updates.check_on_up = true;
        config.assistant.command = "codex --full-auto".to_string();

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert!(deserialized.updates.check_on_up);
        assert_eq!(deserialized.assistant.command, "codex --full-auto");
    }

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/x/y"), home.join("x/y"));
        assert_eq!(expand_home("/abs"), PathBuf::from("/abs"));
    }

    #[test]
    #[serial]
    fn test_load_honours_config_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "[github]\nhost = \"ghe.local\"\n",
        )
        .unwrap();

        std::env::set_var(CONFIG_DIR_ENV, dir.path());
        let config = Config::load();
        std::env::remove_var(CONFIG_DIR_ENV);

        assert_eq!(config.unwrap().github.host, "ghe.local");
    }

    #[test]
    #[serial]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var(CONFIG_DIR_ENV, dir.path());
        let config = Config::load();
        std::env::remove_var(CONFIG_DIR_ENV);

        assert_eq!(config.unwrap().assistant.command, "codex");
    }
}
