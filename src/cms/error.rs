//! Content API errors

use thiserror::Error;

/// Failure talking to the content API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("No {type_name} document with uid {uid:?}")]
    NotFound { type_name: String, uid: String },

    #[error("Content API at {0} did not advertise a master ref")]
    MissingRef(String),
}

impl FetchError {
    /// Whether retrying the same request later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = FetchError::NotFound {
            type_name: "post".to_string(),
            uid: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "No post document with uid \"missing\"");
    }

    #[test]
    fn test_is_transient() {
        let status = |status| FetchError::Status {
            url: "u".to_string(),
            status,
        };
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(404).is_transient());
        assert!(!FetchError::MissingRef("u".to_string()).is_transient());
    }
}
