use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {path} returned {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },
    #[error("unexpected payload from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ApiError>;
