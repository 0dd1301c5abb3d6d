//! Error types for the request client and its supporting stores.

use std::path::PathBuf;

use miette::Diagnostic;

use crate::envelope::FieldErrors;

/// What a caller of the request client gets back on failure.
///
/// `Surfaced` means the failure was already shown to the user (toast, modal
/// or navigation) and needs no further handling. `Field` carries
/// validation errors the calling form should bind.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum RequestError {
    #[error("request failed and was reported to the user")]
    #[diagnostic(code(parley::request::surfaced))]
    Surfaced,

    #[error("validation failed: {}", .0.summary())]
    #[diagnostic(code(parley::request::field))]
    Field(FieldErrors),
}

impl RequestError {
    pub fn is_surfaced(&self) -> bool {
        matches!(self, Self::Surfaced)
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Field(errors) => Some(errors),
            Self::Surfaced => None,
        }
    }
}

/// Failure below the HTTP layer: nothing usable came back.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum TransportError {
    #[error("network error: {0}")]
    #[diagnostic(code(parley::transport::network))]
    Network(String),

    #[error("request timed out")]
    #[diagnostic(code(parley::transport::timeout))]
    Timeout,

    #[error("invalid header value for {name}")]
    #[diagnostic(code(parley::transport::header))]
    InvalidHeader { name: &'static str },
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Persisted client state could not be read or written.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum StorageError {
    #[error(transparent)]
    #[diagnostic(code(parley::storage::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(parley::storage::serde))]
    Serde(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    #[diagnostic(code(parley::storage::poisoned))]
    Poisoned,
}

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config at {}", path.display())]
    #[diagnostic(code(parley::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(parley::config::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(parley::config::toml))]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    #[diagnostic(code(parley::config::toml))]
    TomlSer(#[from] toml::ser::Error),

    #[error("unsupported config format: {}", path.display())]
    #[diagnostic(
        code(parley::config::format),
        help("use a .json or .toml file")
    )]
    UnsupportedFormat { path: PathBuf },
}
