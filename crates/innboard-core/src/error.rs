//! Error types for innboard.

use thiserror::Error;

/// Result type alias using innboard's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for innboard operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Template rendering failed because required fields are absent
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Document generation/manipulation failed
    #[error("Document error: {0}")]
    Document(String),

    /// Signature image could not be decoded
    #[error("Signature decode error: {0}")]
    SignatureDecode(String),

    /// Object storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Signed URL grant rejected (expired or bad signature)
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation exceeded its timeout budget
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("signed document".to_string());
        assert_eq!(err.to_string(), "Not found: signed document");
    }

    #[test]
    fn test_error_display_missing_fields() {
        let err = Error::MissingFields(vec![
            "personal_info.first_name".to_string(),
            "routing_number".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing required fields: personal_info.first_name, routing_number"
        );
    }

    #[test]
    fn test_error_display_signature_decode() {
        let err = Error::SignatureDecode("not a PNG".to_string());
        assert_eq!(err.to_string(), "Signature decode error: not a PNG");
    }

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("upload refused".to_string());
        assert_eq!(err.to_string(), "Storage error: upload refused");
    }

    #[test]
    fn test_error_display_invalid_grant() {
        let err = Error::InvalidGrant("expired".to_string());
        assert_eq!(err.to_string(), "Invalid grant: expired");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout("attachment fetch".to_string());
        assert_eq!(err.to_string(), "Timeout: attachment fetch");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
