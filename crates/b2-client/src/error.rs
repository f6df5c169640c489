//! Client error types

use serde::Deserialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// The service answered with a status of 400 or above
    #[error("B2 API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Response body was not the expected JSON document
    #[error("invalid response document: {0}")]
    Json(#[from] serde_json::Error),

    /// Error status whose body is not a B2 error document (proxy pages, truncated bodies)
    #[error("unexpected response {status}: {body}")]
    UnexpectedResponse { status: u16, body: String },

    /// A file listing did not reach its last page
    #[error("pagination error: {0}")]
    Pagination(String),

    /// Bucket name rejected before sending
    #[error("invalid bucket name: {0}")]
    InvalidBucketName(String),

    /// Bucket type identifier not in the known table
    #[error("unknown bucket type: {0}")]
    UnknownBucketType(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Deserialize)]
struct ErrorDocument {
    status: Option<u16>,
    code: String,
    message: String,
}

impl ClientError {
    /// Build an error from an error response body.
    ///
    /// Only the usual `{status, code, message}` document becomes an API
    /// error. Anything else is [`ClientError::UnexpectedResponse`] carrying
    /// the HTTP status and the raw text.
    pub fn from_error_body(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorDocument>(body) {
            Ok(doc) => Self::Api {
                status: doc.status.unwrap_or(status),
                code: doc.code,
                message: doc.message,
            },
            Err(_) => Self::UnexpectedResponse {
                status,
                body: String::from_utf8_lossy(body).trim().to_string(),
            },
        }
    }

    /// Check if the service rejected the request
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    /// Check if the exchange itself failed (network, I/O, malformed body, runaway listing)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Io(_)
                | Self::Json(_)
                | Self::UnexpectedResponse { .. }
                | Self::Pagination(_)
        )
    }

    /// HTTP status of an API error or unexpected response
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::UnexpectedResponse { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Machine-readable code of an API error
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Check if the session token is no longer accepted
    pub fn is_expired_auth(&self) -> bool {
        matches!(self.code(), Some("expired_auth_token" | "bad_auth_token"))
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_error() {
        let body = br#"{"status": 400, "code": "bad_bucket_id", "message": "Bucket does not exist"}"#;

        match ClientError::from_error_body(400, body) {
            ClientError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, "bad_bucket_id");
                assert_eq!(message, "Bucket does not exist");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_error_body_is_transport_error() {
        let error = ClientError::from_error_body(503, b"<html>Service Unavailable</html>\n");

        assert_eq!(error.status(), Some(503));
        assert_eq!(error.code(), None);
        assert!(error.to_string().contains("Service Unavailable"));
        assert!(!error.is_api());
        assert!(error.is_transport());
    }

    #[test]
    fn test_error_document_missing_code_is_transport_error() {
        let error = ClientError::from_error_body(500, br#"{"message": "oops"}"#);

        assert!(matches!(error, ClientError::UnexpectedResponse { status: 500, .. }));
        assert!(error.is_transport());
    }

    #[test]
    fn test_classification() {
        let expired = ClientError::from_error_body(
            401,
            br#"{"status": 401, "code": "expired_auth_token", "message": "Authorization token has expired"}"#,
        );
        assert!(expired.is_expired_auth());
        assert!(!expired.is_not_found());

        let missing = ClientError::from_error_body(
            404,
            br#"{"status": 404, "code": "not_found", "message": "File not present: abc"}"#,
        );
        assert!(missing.is_not_found());

        let io = ClientError::from(std::io::Error::other("connection reset"));
        assert!(io.is_transport());
        assert_eq!(io.status(), None);
    }
}
