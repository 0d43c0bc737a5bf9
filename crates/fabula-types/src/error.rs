use thiserror::Error;

/// Errors from chat/search backend calls.
///
/// The session engine recovers every variant into the fallback reply; the
/// variants exist so adapters can log and tests can assert on the failure
/// class, not for caller control flow.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("api error (status {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("empty reply")]
    EmptyReply,
}

/// Errors raised while resolving configuration or constructing clients.
///
/// These are fatal at startup; nothing in the request path produces them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {what}: set {env_hint}")]
    MissingCredential {
        what: &'static str,
        env_hint: &'static str,
    },

    #[error("invalid config file {path}: {reason}")]
    InvalidFile { path: String, reason: String },
}

/// Errors from document store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
