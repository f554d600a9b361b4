use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0} is not configured")]
    Unconfigured(&'static str),

    #[error("API request failed: status {status} for {url}")]
    RequestFailed {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Token exchange failed: {0}")]
    AuthExchange(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;
