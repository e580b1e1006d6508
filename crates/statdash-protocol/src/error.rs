use thiserror::Error;

/// Errors raised while interpreting dashboard inputs.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown filter field: {0}")]
    UnknownField(String),

    #[error("invalid base address '{0}': must start with http:// or https://")]
    InvalidBaseUrl(String),
}
