//! Error types for filter-pipes.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while building or running a filter.
///
/// Declining is not an error: filters signal it with
/// [`FilterOutput::Decline`](crate::domain::FilterOutput::Decline).
#[derive(Debug, Error)]
pub enum FilterError {
    /// Missing or malformed option detected before any span is processed
    #[error("Configuration error: {0}")]
    Config(String),

    /// No filter registered under the requested id
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    /// Input text the filter cannot process
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External command could not be started
    #[error("Failed to execute command [{command}]: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// External command exited with an unexpected status
    #[error("Error {} executing command [{command}]: {stderr}", display_code(.code))]
    ProcessFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// External command exceeded its time limit and was killed
    #[error("Command [{command}] timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// External command produced output that is not valid UTF-8
    #[error("Command [{command}] produced invalid UTF-8 output")]
    InvalidOutput { command: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Regex error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl FilterError {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        FilterError::Config(message.into())
    }

    /// Whether this error was detected before touching any text.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FilterError::Config(_) | FilterError::UnknownFilter(_) | FilterError::Regex(_)
        )
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "(signal)".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failed_message() {
        let err = FilterError::ProcessFailed {
            command: "false".to_string(),
            code: Some(1),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Error 1 executing command [false]: boom");

        let err = FilterError::ProcessFailed {
            command: "sleep".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().starts_with("Error (signal)"));
    }

    #[test]
    fn test_timeout_message_keeps_subsecond_limits() {
        let err = FilterError::Timeout {
            command: "sleep 6".to_string(),
            timeout: Duration::from_millis(300),
        };
        assert_eq!(err.to_string(), "Command [sleep 6] timed out after 300ms");

        let err = FilterError::Timeout {
            command: "sleep 90".to_string(),
            timeout: Duration::from_secs(60),
        };
        assert_eq!(err.to_string(), "Command [sleep 90] timed out after 60s");
    }

    #[test]
    fn test_is_configuration() {
        assert!(FilterError::config("bad").is_configuration());
        assert!(FilterError::UnknownFilter("x".to_string()).is_configuration());
        assert!(!FilterError::InvalidInput("x".to_string()).is_configuration());
    }
}
