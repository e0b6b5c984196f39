use thiserror::Error;

use crate::identity::IdentityError;
use crate::sprite::SpriteError;

/// Failures surfaced by the reconciliation engine.
#[derive(Debug, Error)]
pub enum SevenError {
    #[error(transparent)]
    InvalidIdentity(#[from] IdentityError),

    #[error(
        "sprite CLI not found.\n\
         Install it from https://sprites.dev or set [sprite] binary in config.toml"
    )]
    ToolUnavailable,

    #[error("could not query sprite inventory: {0}")]
    InventoryQueryFailed(#[source] SpriteError),

    #[error("gh auth login failed: {0}")]
    AuthLoginFailed(String),

    #[error("gh auth setup-git failed: {0}")]
    AuthSetupFailed(String),

    #[error("repository clone failed: {0}")]
    CloneFailed(#[source] SpriteError),

    #[error("could not parse `sprite upgrade --check` output")]
    UpgradeCheckUnparsable,

    #[error("sprite destroy failed: {0}")]
    DestroyFailed(#[source] SpriteError),

    #[error("{0}")]
    Sprite(SpriteError),

    #[error("{command} failed: {detail}")]
    CommandFailed { command: String, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SpriteError> for SevenError {
    fn from(err: SpriteError) -> Self {
        match err {
            SpriteError::NotInstalled => SevenError::ToolUnavailable,
            other => SevenError::Sprite(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SevenError>;
