use thiserror::Error;

/// Top-level error type shared across the shipchat crates.
///
/// Subsystem crates define their own error types; this one covers the
/// concerns that live in the core crate (configuration, parsing of wire
/// names, serialization).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShipchatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown {kind}: {value}")]
    UnknownName { kind: &'static str, value: String },
}

impl From<toml::de::Error> for ShipchatError {
    fn from(err: toml::de::Error) -> Self {
        ShipchatError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ShipchatError {
    fn from(err: toml::ser::Error) -> Self {
        ShipchatError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ShipchatError {
    fn from(err: serde_json::Error) -> Self {
        ShipchatError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for core operations.
pub type Result<T> = std::result::Result<T, ShipchatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShipchatError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_unknown_name_display() {
        let err = ShipchatError::UnknownName {
            kind: "intent",
            value: "dance".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown intent: dance");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ShipchatError = io_err.into();
        assert!(matches!(err, ShipchatError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("= nope").unwrap_err();
        let err: ShipchatError = toml_err.into();
        assert!(matches!(err, ShipchatError::Config(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: ShipchatError = json_err.into();
        assert!(matches!(err, ShipchatError::Serialization(_)));
    }
}
