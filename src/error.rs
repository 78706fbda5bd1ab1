// Crate-wide error type

use std::fmt;
use std::error::Error as StdError;

#[derive(Debug)]
pub enum AppError {
    NetworkError(String),
    /// Every connect attempt was refused and the retry policy gave up.
    ConnectionRefused(String),
    IOError(std::io::Error),
    SerializationError(serde_json::Error),
    DecodeError(serde_json::Error),
    FramingError(String),
    ConfigError(String),
    TopologyError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            AppError::ConnectionRefused(msg) => write!(f, "Connection refused: {}", msg),
            AppError::IOError(err) => write!(f, "IO error: {}", err),
            AppError::SerializationError(err) => write!(f, "Serialization error: {}", err),
            AppError::DecodeError(err) => write!(f, "Decode error: {}", err),
            AppError::FramingError(msg) => write!(f, "Framing error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::TopologyError(msg) => write!(f, "Topology error: {}", msg),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::IOError(err) => Some(err),
            AppError::SerializationError(err) => Some(err),
            AppError::DecodeError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IOError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
