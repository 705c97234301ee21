use thiserror::Error;

use super::Provider;

/// ridecompare error types
#[derive(Error, Debug)]
pub enum RideCompareError {
    /// A quote passed the inclusion rule but its price could not be parsed
    #[error("malformed quote from {provider} for {ride_type}: {price_text:?}")]
    MalformedQuote {
        provider: Provider,
        ride_type: String,
        price_text: String,
    },

    /// Price aggregation endpoint unreachable or returned an error status
    #[error("price fetch failed: {message}")]
    UpstreamFetch {
        status: Option<u16>,
        message: String,
    },

    /// Coordinates out of range or unparseable
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// Failed to parse JSON input
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Deep link could not be assembled
    #[error("link error: {0}")]
    Link(#[from] url::ParseError),
}

impl RideCompareError {
    /// Build an upstream failure without an HTTP status (transport, decode)
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            status: None,
            message: message.into(),
        }
    }
}

/// Result type alias for ridecompare
pub type Result<T> = std::result::Result<T, RideCompareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RideCompareError::Parse("invalid json".into());
        assert_eq!(err.to_string(), "parse error: invalid json");
    }

    #[test]
    fn test_malformed_quote_display() {
        let err = RideCompareError::MalformedQuote {
            provider: Provider::Ola,
            ride_type: "Mini".into(),
            price_text: "call us".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed quote from Ola for Mini: \"call us\""
        );
    }

    #[test]
    fn test_upstream_helper_has_no_status() {
        let err = RideCompareError::upstream("connection refused");
        assert!(matches!(
            err,
            RideCompareError::UpstreamFetch { status: None, .. }
        ));
        assert_eq!(err.to_string(), "price fetch failed: connection refused");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RideCompareError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }
}
