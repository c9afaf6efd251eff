//! Unified error type for apim-migrate.
//!
//! All public APIs return `Result<T, MigrateError>`. Credential errors
//! (`Registration`, `Token`) are fatal to a run; the per-item variants
//! (`Export`, `Archive`, `Import`, `Mapping`) carry the context needed to
//! report one failed item while the batch continues.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::archive::KeyStage;

/// A failed HTTP exchange: either the transport broke, the platform rejected
/// the request, or the response body could not be decoded.
#[derive(Debug, Error)]
pub enum HttpFailure {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Why a single key-mapping attempt failed.
#[derive(Debug, Error)]
pub enum MappingFailure {
    #[error(transparent)]
    Http(#[from] HttpFailure),

    /// The client secret stored in the archive metadata was not valid base64.
    #[error("invalid client secret: {0}")]
    Secret(String),
}

/// The unified error type for all apim-migrate operations.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("dynamic client registration failed: {source}")]
    Registration {
        #[source]
        source: HttpFailure,
    },

    #[error("access token issuance failed: {source}")]
    Token {
        #[source]
        source: HttpFailure,
    },

    #[error("listing applications failed: {source}")]
    List {
        #[source]
        source: HttpFailure,
    },

    #[error("export of {owner}:{name} failed: {source}")]
    Export {
        owner: String,
        name: String,
        #[source]
        source: HttpFailure,
    },

    #[error("archive {}: {message}", file.display())]
    Archive { file: PathBuf, message: String },

    #[error("import of {owner}:{name} failed: {source}")]
    Import {
        owner: String,
        name: String,
        #[source]
        source: HttpFailure,
    },

    #[error("key mapping for application {application_id} ({key_manager}/{stage}) failed: {source}")]
    Mapping {
        application_id: String,
        key_manager: String,
        stage: KeyStage,
        #[source]
        source: MappingFailure,
    },

    #[error("token revocation failed: {source}")]
    Revoke {
        #[source]
        source: HttpFailure,
    },
}

impl MigrateError {
    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        MigrateError::Config(message.into())
    }

    /// Create an archive error for the given file.
    pub fn archive(file: impl Into<PathBuf>, message: impl ToString) -> Self {
        MigrateError::Archive {
            file: file.into(),
            message: message.to_string(),
        }
    }
}

/// Convenience type alias for Results using MigrateError.
pub type Result<T> = std::result::Result<T, MigrateError>;
