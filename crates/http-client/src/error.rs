use thiserror::Error;

use crate::arena::RequestId;

/// A type alias for handling `Result`s with `HttpError`
pub type Result<T> = std::result::Result<T, HttpError>;

/// Errors returned synchronously by the HTTP client.
///
/// Failures of an executed request (timeout, IO error, refused submission)
/// are not errors: they reach the request's handler as an
/// [`HttpResponse`](crate::HttpResponse) with the matching status.
#[derive(Error, Debug)]
pub enum HttpError {
    /// The target could not be parsed or uses an unsupported scheme
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// The request was executed to completion, cancelled, or never existed
    #[error("Request not found: {0}")]
    RequestNotFound(RequestId),

    #[error("Request already executed: {0}")]
    AlreadyExecuted(RequestId),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] sipauth_core::AuthError),
}
