use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Booking failed: {detail}")]
    BookingFailed { detail: String },

    #[error("Polling cancelled")]
    Cancelled,

    #[error("Polling stopped after {attempts} attempts without a bookable slot")]
    PollingExhausted { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Protocol,
    Configuration,
    Polling,
    Booking,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Network,
            Self::HttpStatus { .. } | Self::MalformedResponse { .. } | Self::Serialization(_) => {
                ErrorCategory::Protocol
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::Cancelled | Self::PollingExhausted { .. } => ErrorCategory::Polling,
            Self::BookingFailed { .. } => ErrorCategory::Booking,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cancelled => ErrorSeverity::Low,
            Self::Transport(_)
            | Self::HttpStatus { .. }
            | Self::MalformedResponse { .. }
            | Self::PollingExhausted { .. } => ErrorSeverity::Medium,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::BookingFailed { .. }
            | Self::Serialization(_) => ErrorSeverity::High,
            Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// 輪詢期間可以跳過此週期並重試的錯誤
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::HttpStatus { .. } | Self::MalformedResponse { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Transport(_) => "Check network connectivity or raise polling.request_timeout_seconds",
            Self::HttpStatus { status: 401, .. } | Self::HttpStatus { status: 403, .. } => {
                "The auth token was rejected; copy a fresh x-csrf-token from the browser"
            }
            Self::HttpStatus { .. } => "The booking service returned an error; retry later",
            Self::MalformedResponse { .. } => {
                "The service response format may have changed; check [service] persisted_query_hash"
            }
            Self::Serialization(_) => "Inspect the request payload for invalid values",
            Self::IoError(_) => "Check that the configuration file exists and is readable",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file and make sure referenced environment variables are set"
            }
            Self::BookingFailed { .. } => {
                "Read the raw response above; the slot may have been taken or the token expired"
            }
            Self::Cancelled => "Polling was interrupted; run again to resume",
            Self::PollingExhausted { .. } => {
                "Raise polling.max_attempts / max_duration_seconds or try another time"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Transport(e) if e.is_timeout() => "The booking service did not answer in time".to_string(),
            Self::Transport(_) => "Could not reach the booking service".to_string(),
            Self::HttpStatus { status, .. } => format!("The booking service answered with HTTP {}", status),
            Self::MalformedResponse { .. } => "The booking service sent an unexpected response".to_string(),
            Self::BookingFailed { detail } => format!("Reservation was not confirmed: {}", detail),
            Self::Cancelled => "Stopped before a reservation was made".to_string(),
            Self::PollingExhausted { attempts } => {
                format!("No table became available after {} attempts", attempts)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_errors_are_retryable() {
        let status = BotError::HttpStatus {
            status: 503,
            body: "busy".to_string(),
        };
        assert!(status.is_retryable());
        assert_eq!(status.category(), ErrorCategory::Protocol);
        assert!(BotError::malformed("missing data").is_retryable());
    }

    #[test]
    fn test_booking_failure_is_not_retryable() {
        let err = BotError::BookingFailed {
            detail: "HTTP 409: slot gone".to_string(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Booking);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("slot gone"));
    }

    #[test]
    fn test_cancel_is_low_severity() {
        assert_eq!(BotError::Cancelled.severity(), ErrorSeverity::Low);
        assert_eq!(
            BotError::PollingExhausted { attempts: 3 }.severity(),
            ErrorSeverity::Medium
        );
    }

    #[test]
    fn test_auth_status_suggestion() {
        let err = BotError::HttpStatus {
            status: 403,
            body: String::new(),
        };
        assert!(err.recovery_suggestion().contains("token"));
    }
}
