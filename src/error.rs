//! Error types and handling for the travel advisor

use thiserror::Error;

/// Main error type for the travel advisor
#[derive(Error, Debug)]
pub enum AdvisoryError {
    /// Bad city name or query parameters supplied by the caller
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Weather, country or city-discovery API failures
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// Persistence failures
    #[error("Store error: {message}")]
    Store { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AdvisoryError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new upstream error
    pub fn upstream<S: Into<String>>(message: S) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Create a new store error
    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AdvisoryError::Validation { message } => message.clone(),
            AdvisoryError::Upstream { .. } => {
                "Unable to reach the weather or country services. Please try again later."
                    .to_string()
            }
            AdvisoryError::Store { .. } => {
                "Advisory storage is unavailable. Check the store location and permissions."
                    .to_string()
            }
            AdvisoryError::Config { message } => format!("Configuration error: {message}"),
            AdvisoryError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }

    /// HTTP status code used when this error crosses the API boundary
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            AdvisoryError::Validation { .. } => 400,
            AdvisoryError::Upstream { .. } => 502,
            AdvisoryError::Store { .. }
            | AdvisoryError::Config { .. }
            | AdvisoryError::Io { .. } => 500,
        }
    }
}

impl From<fjall::Error> for AdvisoryError {
    fn from(err: fjall::Error) -> Self {
        AdvisoryError::store(err.to_string())
    }
}

impl From<postcard::Error> for AdvisoryError {
    fn from(err: postcard::Error) -> Self {
        AdvisoryError::store(format!("record encoding failed: {err}"))
    }
}

impl From<tokio::task::JoinError> for AdvisoryError {
    fn from(err: tokio::task::JoinError) -> Self {
        AdvisoryError::store(format!("store task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let validation_err = AdvisoryError::validation("City is required");
        assert!(matches!(validation_err, AdvisoryError::Validation { .. }));

        let upstream_err = AdvisoryError::upstream("connection failed");
        assert!(matches!(upstream_err, AdvisoryError::Upstream { .. }));

        let store_err = AdvisoryError::store("disk full");
        assert!(matches!(store_err, AdvisoryError::Store { .. }));
    }

    #[test]
    fn test_user_messages() {
        let validation_err = AdvisoryError::validation("City name too short");
        assert_eq!(validation_err.user_message(), "City name too short");

        let upstream_err = AdvisoryError::upstream("timeout");
        assert!(upstream_err.user_message().contains("Unable to reach"));

        let config_err = AdvisoryError::config("bad port");
        assert!(config_err.user_message().contains("bad port"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AdvisoryError::validation("x").status_code(), 400);
        assert_eq!(AdvisoryError::upstream("x").status_code(), 502);
        assert_eq!(AdvisoryError::store("x").status_code(), 500);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let advisory_err: AdvisoryError = io_err.into();
        assert!(matches!(advisory_err, AdvisoryError::Io { .. }));
    }
}
