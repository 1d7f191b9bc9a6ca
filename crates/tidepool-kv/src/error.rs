//! Facade error types

use thiserror::Error;
use tidepool_codec::CodecError;

/// Result type alias for facade operations
pub type KvResult<T> = std::result::Result<T, KvError>;

/// Errors surfaced by the facade
///
/// A missing key is not an error: get-style operations return `None`.
#[derive(Error, Debug)]
pub enum KvError {
    /// Connecting, selecting the database or disconnecting failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store rejected or failed a command; carries the store's own error
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// Stored object text could not be decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Stored text is not an integer literal
    #[error("Invalid integer: {0:?}")]
    InvalidInteger(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not connected")]
    NotConnected,
}

impl KvError {
    /// Returns true for connect/disconnect failures and use of a closed facade
    pub fn is_connection_error(&self) -> bool {
        matches!(self, KvError::Connection(_) | KvError::NotConnected)
    }

    /// Returns true if stored data could not be interpreted
    pub fn is_parse_error(&self) -> bool {
        matches!(self, KvError::Codec(_) | KvError::InvalidInteger(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            KvError::Connection("refused".to_string()).to_string(),
            "Connection error: refused"
        );
        assert_eq!(
            KvError::InvalidInteger("12x".to_string()).to_string(),
            "Invalid integer: \"12x\""
        );
        assert_eq!(KvError::NotConnected.to_string(), "Not connected");
    }

    #[test]
    fn test_store_error_passthrough() {
        let inner = redis::RedisError::from((
            redis::ErrorKind::ResponseError,
            "WRONGTYPE",
            "Operation against a key holding the wrong kind of value".to_string(),
        ));
        let err = KvError::from(inner);
        assert!(matches!(&err, KvError::Store(e) if e.kind() == redis::ErrorKind::ResponseError));
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_classification() {
        let parse = tidepool_codec::decode("{").unwrap_err();
        assert!(KvError::from(parse).is_parse_error());
        assert!(KvError::NotConnected.is_connection_error());
        assert!(!KvError::Configuration("x".to_string()).is_parse_error());
    }
}
