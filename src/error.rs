use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    /// Missing or malformed caller-supplied arguments. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The provider answered but had nothing matching the request.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Non-success provider status, or a transport/parse failure talking to it.
    #[error("Provider error ({status}): {detail}")]
    ProviderError { status: String, detail: String },
}

impl DiscoveryError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn provider(status: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ProviderError {
            status: status.into(),
            detail: detail.into(),
        }
    }
}

pub type LocationError = DiscoveryError;

pub type Result<T> = std::result::Result<T, DiscoveryError>;
