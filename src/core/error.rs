use std::io;
use thiserror::Error;

/// Unified error type for the obchat application
#[derive(Error, Debug)]
pub enum ObchatError {
    /// Backend API errors (non-2xx status, success=false payloads)
    #[error("API error: {0}")]
    Api(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input errors
    #[error("Input error: {0}")]
    Input(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),

    /// Unknown or unexpected errors
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for ObchatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ObchatError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ObchatError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            ObchatError::Api(format!("API returned error status: {}", err))
        } else {
            ObchatError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for ObchatError {
    fn from(err: serde_json::Error) -> Self {
        ObchatError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for ObchatError {
    fn from(err: serde_yml::Error) -> Self {
        ObchatError::Serialization(format!("YAML error: {}", err))
    }
}

impl From<String> for ObchatError {
    fn from(err: String) -> Self {
        ObchatError::Unknown(err)
    }
}

impl From<&str> for ObchatError {
    fn from(err: &str) -> Self {
        ObchatError::Unknown(err.to_string())
    }
}
