use crate::app::{ConfigError, InitializationError};
use crate::normalizer::NormalizerError;
use crate::sender::ClientError;
use thiserror::Error;

/// Top-level error type for the agent.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Normalizer error: {0}")]
    Normalizer(#[from] NormalizerError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Initialization error: {0}")]
    Initialization(#[from] InitializationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Delivery error: {0}")]
    Delivery(String),
}
