use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend rejected the credential and the local retry budget is
    /// exhausted. The session has been cleared.
    #[error("Unauthorized: credential rejected by the backend")]
    Unauthorized,

    /// No credential is present, so an authenticated operation cannot run.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Refresh reached the backend but got a non-401 failure status.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl SessionError {
    /// True when the failure is a transport-level one (backend unreachable,
    /// timed out) rather than a definitive rejection. Transport failures are
    /// candidates for degrading to offline mode instead of logging out.
    pub fn is_transport(&self) -> bool {
        match self {
            SessionError::Network(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }
}
