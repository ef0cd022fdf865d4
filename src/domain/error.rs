use thiserror::Error;

/// Core cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Store error: {message}")]
    Store { message: String },
}

impl CacheError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error() {
        let error = CacheError::configuration("host may not be empty");
        assert_eq!(
            error.to_string(),
            "Configuration error: host may not be empty"
        );
    }

    #[test]
    fn test_serialization_error() {
        let error = CacheError::serialization("unsupported value");
        assert_eq!(error.to_string(), "Serialization error: unsupported value");
    }

    #[test]
    fn test_store_error() {
        let error = CacheError::store("connection refused");
        assert_eq!(error.to_string(), "Store error: connection refused");
    }
}
