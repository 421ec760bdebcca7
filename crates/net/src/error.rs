//! Gateway error types

/// Gateway result type
pub type Result<T> = std::result::Result<T, Error>;

/// Gateway errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The session is expired or was rejected. Tokens have already been cleared.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Non-2xx response
    #[error("API error: {status} - {body}")]
    Http { status: u16, body: String },

    /// Transport failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request body could not be encoded
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Endpoint path could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Local session storage failed
    #[error("Session storage error: {0}")]
    Storage(#[from] finagent_core::Error),
}

impl Error {
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    /// HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            Error::Auth(_)
            | Error::Network(_)
            | Error::Encode(_)
            | Error::InvalidUrl(_)
            | Error::Storage(_) => None,
        }
    }
}
