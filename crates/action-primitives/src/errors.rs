//! Error types surfaced by automation backends

use thiserror::Error;

/// Fault kinds an automation backend can report back to the interpreter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AutomationError {
    /// No element matched the locator
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// The selector expression itself is malformed
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// Element exists but cannot receive the interaction (hidden, disabled, zero-size)
    #[error("element not interactable: {0}")]
    NotInteractable(String),

    /// Backend rejected an argument (bad index, unsupported target, missing file)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Explicit wait expired before its condition held
    #[error("wait timeout: {0}")]
    WaitTimeout(String),

    /// Browser transport or protocol failure
    #[error("driver error: {0}")]
    Driver(String),
}

impl AutomationError {
    /// Stable identifier used in logs
    pub fn code(&self) -> &'static str {
        match self {
            AutomationError::ElementNotFound(_) => "element_not_found",
            AutomationError::InvalidSelector(_) => "invalid_selector",
            AutomationError::NotInteractable(_) => "not_interactable",
            AutomationError::InvalidArgument(_) => "invalid_argument",
            AutomationError::WaitTimeout(_) => "wait_timeout",
            AutomationError::Driver(_) => "driver",
        }
    }
}

pub type AutomationResult<T> = Result<T, AutomationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let all = [
            AutomationError::ElementNotFound(String::new()),
            AutomationError::InvalidSelector(String::new()),
            AutomationError::NotInteractable(String::new()),
            AutomationError::InvalidArgument(String::new()),
            AutomationError::WaitTimeout(String::new()),
            AutomationError::Driver(String::new()),
        ];
        let mut codes: Vec<_> = all.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn display_includes_detail() {
        let err = AutomationError::ElementNotFound("css #go".into());
        assert_eq!(err.to_string(), "element not found: css #go");
    }
}
