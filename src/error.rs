use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No Telegram bot token configured. Set TELEGRAM_BOT_TOKEN or `telegram_token` in eventblast.toml.")]
    MissingBotToken,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failures while loading identity, target or proxy files.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{kind} file not found: {}", path.display())]
    NotFound { kind: &'static str, path: PathBuf },

    #[error("error reading {kind} file {}: {source}", path.display())]
    Read {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl InputError {
    pub(crate) fn from_io(kind: &'static str, path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            InputError::NotFound { kind, path }
        } else {
            InputError::Read { kind, path, source }
        }
    }
}
