//! Error types for the speedtest monitor
//!
//! Each stage of a cycle has its own error type; [`MonitorError`] gathers them
//! and classifies each one so the loop can pick the right recovery.

use crate::speedtest::MeasurementError;
use crate::transport::mqtt::MqttError;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Main error type for monitor operations
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Measurement failed: {0}")]
    Measurement(#[from] MeasurementError),

    #[error("Publishing failed: {0}")]
    Publish(#[from] MqttError),

    #[error("Unexpected error: {message}")]
    Unexpected { message: String },
}

/// How the monitor loop reacts to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Cycle produced no measurement; keep the normal schedule
    Skip,
    /// Measurement was taken but not delivered; keep the normal schedule
    Logged,
    /// Something unanticipated broke the cycle; wait the recovery delay
    Backoff,
}

impl MonitorError {
    pub fn class(&self) -> ErrorClass {
        match self {
            MonitorError::Measurement(_) => ErrorClass::Skip,
            MonitorError::Publish(_) => ErrorClass::Logged,
            MonitorError::Unexpected { .. } => ErrorClass::Backoff,
        }
    }

    /// Create unexpected error
    pub fn unexpected<S: Into<String>>(message: S) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }
}

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|passwd|token|key|secret)[=:]\s*\S+").expect("valid secret regex")
});

const MAX_MESSAGE_LEN: usize = 500;

/// Sanitize text from external collaborators before it reaches the logs
///
/// Credential-looking pairs are redacted and the result is capped at 500 bytes.
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = SECRET_PATTERN
        .replace_all(message.trim(), "${1}=***")
        .to_string();

    if sanitized.len() > MAX_MESSAGE_LEN {
        let truncate_suffix = "...[truncated]";
        let mut cut = MAX_MESSAGE_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str(truncate_suffix);
    }

    sanitized
}

/// Result type for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;
