use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error(
        "sprite CLI not found.\n\
         Install it from https://sprites.dev or set [sprite] binary in config.toml"
    )]
    NotInstalled,

    #[error("sprite name is required")]
    EmptyName,

    #[error("{command} failed: {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SpriteError {
    pub(crate) fn failed(command: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SpriteError>;
