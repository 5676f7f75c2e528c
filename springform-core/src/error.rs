use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Upstream reported failure: {0}")]
    Upstream(String),

    #[error("Unexpected response shape: {0}")]
    BadEnvelope(String),
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Missing build artifact: {0}")]
    MissingArtifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
