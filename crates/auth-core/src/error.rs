//! Error types for authentication operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid challenge: {0}")]
    InvalidChallenge(String),

    #[error("Configuration error: {0}")]
    Config(#[from] sipauth_infra_common::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AuthError>;
