use pophub_api::ApiError;
use thiserror::Error;

/// All the ways a catalog call can fail
///
/// An unconfigured provider is only an error on the item/recommendation
/// paths; search and category calls turn it into `Listing::Disabled`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} is not configured")]
    Unconfigured(String),

    #[error("Upstream request failed: {0}")]
    UpstreamHttp(String),

    #[error("Authentication failed: {0}")]
    AuthExchangeFailure(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Cache operation failed: {0}")]
    CacheError(#[from] pophub_cache::CacheError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unconfigured(provider) => Error::Unconfigured(provider.to_string()),
            ApiError::AuthExchange(msg) => Error::AuthExchangeFailure(msg),
            ApiError::ParseError(e) => Error::SerializationError(e),
            e @ (ApiError::RequestFailed { .. } | ApiError::NetworkError(_)) => {
                Error::UpstreamHttp(e.to_string())
            }
        }
    }
}
