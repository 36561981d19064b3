// src/errors.rs

use thiserror::Error;

/// Everything that can go wrong between loading the context document and
/// receiving a reply from the model service.
#[derive(Debug, Error)]
pub enum ConsejeroError {
    /// Missing credential or an invalid configuration value.
    #[error("{0}")]
    Config(String),

    /// The knowledge document could not be fetched or parsed.
    #[error("{0}")]
    Load(String),

    /// The model service did not produce a reply.
    #[error("{0}")]
    Send(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Logger(#[from] flexi_logger::FlexiLoggerError),
}

impl ConsejeroError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn load_error(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    pub fn send_error(msg: impl Into<String>) -> Self {
        Self::Send(msg.into())
    }
}

pub type ConsejeroResult<T> = Result<T, ConsejeroError>;
