use thiserror::Error;

/// Errors raised by the shared infrastructure
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is missing, malformed or holds an invalid value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading or writing a configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted document could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result alias for infrastructure operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
