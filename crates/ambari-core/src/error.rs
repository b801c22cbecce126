//! Error types for the Ambari provider.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Privilege ID not found for {principal_type} {principal_name} ({permission_name}) on cluster {cluster_name}")]
    PrivilegeIdNotFound {
        cluster_name: String,
        permission_name: String,
        principal_name: String,
        principal_type: String,
    },

    #[error("{count} privileges match {principal_type} {principal_name} ({permission_name}) on cluster {cluster_name}, expected exactly one")]
    AmbiguousPrivilege {
        count: usize,
        cluster_name: String,
        permission_name: String,
        principal_name: String,
        principal_type: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid lifecycle transition: {0}")]
    InvalidTransition(String),

    #[error("Unknown resource kind: {0}")]
    UnknownResourceKind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this is the not-found sentinel returned by the remote API.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
