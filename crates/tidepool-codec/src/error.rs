//! Codec error types

use thiserror::Error;

/// Errors raised while converting values to or from wire text
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let inner = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CodecError::Parse(inner);
        assert!(err.to_string().starts_with("Parse error: "));
    }
}
