use thiserror::Error;

#[derive(Error, Debug)]
pub enum FastlyError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("No ID found while {operation}")]
    MissingIdentifier { operation: &'static str },

    #[error("TLS configuration '{name}' not found")]
    TlsConfigurationNotFound { name: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl FastlyError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ApiError(e) if e.is_timeout() || e.is_connect() => ErrorSeverity::Medium,
            Self::ApiError(_) | Self::SerializationError(_) => ErrorSeverity::High,
            Self::MissingIdentifier { .. } | Self::TlsConfigurationNotFound { .. } => {
                ErrorSeverity::High
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ValidationError { .. }
            | Self::UrlError(_) => ErrorSeverity::Critical,
            Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(e) => match e.status() {
                Some(status) => format!("Fastly API returned {}", status),
                None => "Could not reach the Fastly API".to_string(),
            },
            Self::SerializationError(_) => "Fastly API returned an unexpected response".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(e) if e.status().map(|s| s.as_u16()) == Some(401) => {
                "Check that the API key is valid and has TLS management permissions"
            }
            Self::ApiError(e) if e.status().map(|s| s.as_u16()) == Some(403) => {
                "The API key lacks permission for this operation"
            }
            Self::ApiError(_) => "Check network connectivity and retry",
            Self::SerializationError(_) => "Retry later or report the response body",
            Self::MissingIdentifier { .. } => "Pass the id of the resource",
            Self::TlsConfigurationNotFound { .. } => {
                "Check the TLS configuration name with the `configurations` command"
            }
            Self::IoError(_) => "Check that the file exists and is readable",
            _ => "Fix the configuration and try again",
        }
    }
}

pub type Result<T> = std::result::Result<T, FastlyError>;
