//! Error types for the configuration cache

use thiserror::Error;

/// Result type alias for configuration cache operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main error type for the configuration cache
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A round-trip to the configuration service failed (transport error,
    /// unexpected status code, or an unparseable response body).
    ///
    /// Always recoverable inside the refresh loop, which logs it and skips
    /// the cycle; only fatal when it happens during construction.
    #[error("config service fetch failed: {message}")]
    Fetch {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A declared binding names a key the current snapshot does not hold
    #[error("parameter {key} not found")]
    MissingKey { key: String },

    /// A setting value does not parse as the kind its binding declares
    #[error("failed to convert {value:?} for field {field}: {message}")]
    Conversion {
        field: String,
        value: String,
        message: String,
    },

    /// A binding declares a kind the materializer does not support.
    /// Programmer error, reported when the binding table is built.
    #[error("unsupported kind {kind:?} declared for field {field}")]
    UnsupportedType { field: String, kind: String },
}

impl ConfigError {
    /// Create a new fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch {
            message: msg.into(),
            status: None,
            source: None,
        }
    }

    /// Create a new fetch error carrying the offending HTTP status code
    pub fn fetch_with_status(msg: impl Into<String>, status: u16) -> Self {
        Self::Fetch {
            message: msg.into(),
            status: Some(status),
            source: None,
        }
    }

    /// Create a new fetch error wrapping an underlying transport error
    pub fn fetch_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Fetch {
            message: msg.into(),
            status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a new missing-key error
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Create a new conversion error
    pub fn conversion(
        field: impl Into<String>,
        value: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            field: field.into(),
            value: value.into(),
            message: msg.into(),
        }
    }

    /// Create a new unsupported-kind error
    pub fn unsupported_type(field: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedType {
            field: field.into(),
            kind: kind.into(),
        }
    }

    /// Whether retrying the same fetch could plausibly succeed.
    ///
    /// Transport failures (no HTTP status available) and server errors (5xx)
    /// qualify; client errors and materialization errors do not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { status: Some(code), .. } => *code >= 500,
            Self::Fetch { status: None, .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn test_display_formatting() {
        let fetch = ConfigError::fetch_with_status("unexpected status code", 503);
        assert_eq!(
            fetch.to_string(),
            "config service fetch failed: unexpected status code"
        );

        let missing = ConfigError::missing_key("http.port");
        assert_eq!(missing.to_string(), "parameter http.port not found");

        let conversion = ConfigError::conversion("port", "notanumber", "invalid digit");
        assert!(conversion.to_string().contains("notanumber"));
        assert!(conversion.to_string().contains("port"));

        let unsupported = ConfigError::unsupported_type("ratio", "float");
        assert!(unsupported.to_string().contains("float"));
        assert!(unsupported.to_string().contains("ratio"));
    }

    #[test]
    fn test_source_chain_preserved() {
        let io_error = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let wrapped = ConfigError::fetch_with_source("request to config service failed", io_error);

        assert!(wrapped.source().is_some());
        assert!(wrapped
            .source()
            .unwrap()
            .to_string()
            .contains("connection refused"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ConfigError::fetch("connect error").is_retryable());
        assert!(ConfigError::fetch_with_status("server error", 500).is_retryable());
        assert!(ConfigError::fetch_with_status("server error", 503).is_retryable());
        assert!(!ConfigError::fetch_with_status("client error", 404).is_retryable());
        assert!(!ConfigError::fetch_with_status("client error", 403).is_retryable());
        assert!(!ConfigError::missing_key("port").is_retryable());
        assert!(!ConfigError::conversion("port", "x", "bad digit").is_retryable());
        assert!(!ConfigError::unsupported_type("ratio", "float").is_retryable());
    }
}
