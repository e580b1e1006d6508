use statdash_protocol::ProtocolError;
use thiserror::Error;

/// Failures to complete an exchange with the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status. `embedded_error` carries the `error` field of a JSON
    /// body when the backend sent one.
    #[error("backend returned HTTP {status}")]
    Status {
        status: u16,
        embedded_error: Option<String>,
    },

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// Error message supplied by the backend inside a failure response.
    pub fn embedded_error(&self) -> Option<&str> {
        match self {
            ClientError::Status {
                embedded_error: Some(msg),
                ..
            } if !msg.is_empty() => Some(msg),
            _ => None,
        }
    }
}
