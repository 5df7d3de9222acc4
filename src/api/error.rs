/// Error taxonomy for the generation API
///
/// Every failure the client can hit maps to one of these variants, and
/// every variant has a distinct message suitable for the error banner.
/// Classification happens where the failure is observed, so the variants
/// carry plain strings instead of source errors (messages cross the UI
/// boundary and must be Clone).
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server could not be reached at all
    #[error("Cannot reach the API server - check that it is running")]
    Network(String),

    /// A request (or the whole poll budget) ran out of time
    #[error("Request timed out - the server may be busy")]
    Timeout,

    /// The server answered with a non-2xx status
    #[error("Server error ({status}): {detail}")]
    Server { status: u16, detail: String },

    /// The job reached its failed state and reported why
    #[error("Generation failed: {0}")]
    JobFailed(String),

    /// The polled job id is unknown to the server
    #[error("Job not found - it may have expired on the server")]
    JobNotFound,

    /// Anything that fits nowhere else (undecodable bodies included)
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    /// Classify a transport-level reqwest failure
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() || err.is_request() {
            ApiError::Network(err.to_string())
        } else {
            ApiError::Unexpected(err.to_string())
        }
    }

    /// True for failures that mean the server itself is unreachable
    ///
    /// These flip the connectivity indicator to offline and trigger a
    /// health re-probe; server-side failures (5xx, failed jobs) do not,
    /// since the server clearly answered.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connectivity_classes() {
        assert!(ApiError::Network("refused".to_string()).is_connectivity());
        assert!(ApiError::Timeout.is_connectivity());

        assert!(!ApiError::Server { status: 500, detail: "boom".to_string() }.is_connectivity());
        assert!(!ApiError::JobFailed("oom".to_string()).is_connectivity());
        assert!(!ApiError::JobNotFound.is_connectivity());
        assert!(!ApiError::Unexpected("?".to_string()).is_connectivity());
    }

    #[test]
    fn test_messages_are_distinct() {
        let errors = [
            ApiError::Network("refused".to_string()),
            ApiError::Timeout,
            ApiError::Server { status: 503, detail: "warming up".to_string() },
            ApiError::JobFailed("oom".to_string()),
            ApiError::JobNotFound,
            ApiError::Unexpected("?".to_string()),
        ];

        for (i, a) in errors.iter().enumerate() {
            for b in errors.iter().skip(i + 1) {
                assert_ne!(a.to_string(), b.to_string());
            }
        }
    }

    #[test]
    fn test_server_error_carries_detail() {
        let err = ApiError::Server { status: 500, detail: "model not loaded".to_string() };
        assert_eq!(
            err.to_string(),
            "Server error (500): model not loaded"
        );
    }
}
