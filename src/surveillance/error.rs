//! Error type shared by every surveillance operation

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-success status from the endpoint; the message is the raw response body
    #[error("{body}")]
    Http { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown disease: {0}")]
    UnknownDisease(String),

    #[error("Unknown season: {0}")]
    UnknownSeason(i32),

    #[error("Missing freshness metadata: response carried no Last-Modified header")]
    MissingLastModified,

    #[error("Invalid Last-Modified value: {0}")]
    InvalidLastModified(String),

    #[error("Snapshot name does not match '<prefix>__<unix>.csv': {0}")]
    InvalidSnapshotName(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_is_raw_body() {
        let err = FetchError::Http {
            status: 400,
            body: "bad request".to_string(),
        };
        assert_eq!(err.to_string(), "bad request");
    }
}
