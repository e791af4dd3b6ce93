use thiserror::Error;

/// Result type alias for statistics client operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Failures surfaced by [`crate::api::StatsClient`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    /// Service unreachable, connection reset, timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The body was not valid JSON for the requested resource.
    #[error("Invalid response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// True when the service could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Http(err) if err.is_connect() || err.is_timeout())
    }
}
