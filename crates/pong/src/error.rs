//! Error types for the game and its hardware session

use de2i::HardwareError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PongError {
    #[error("hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("cannot spawn thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),

    #[error("{name} thread panicked")]
    ThreadPanicked { name: &'static str },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl PongError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

pub type PongResult<T> = Result<T, PongError>;
