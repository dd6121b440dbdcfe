//! Relay error taxonomy
//!
//! Every failure the relayer can report falls into one of four categories.
//! Config, connection and scan errors abort the invocation before any
//! transaction is sent; submission errors are reported per event.

use thiserror::Error;

use crate::types::{ChainRole, TargetFunction};

/// Coarse error category used for exit codes and log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Connection,
    Scan,
    Submission,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Config => "config",
            ErrorCategory::Connection => "connection",
            ErrorCategory::Scan => "scan",
            ErrorCategory::Submission => "submission",
        }
    }
}

/// Errors produced by the relay core
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid chain: {0} (expected 'source' or 'destination')")]
    InvalidRole(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection to {role} chain failed: {message}")]
    Connection { role: ChainRole, message: String },

    #[error("Chain id mismatch on {role}: expected {expected}, endpoint reports {actual}")]
    ChainIdMismatch {
        role: ChainRole,
        expected: u64,
        actual: u64,
    },

    #[error("Scan of {role} chain failed: {message}")]
    Scan { role: ChainRole, message: String },

    #[error("Submission of {function} (nonce {nonce}) failed: {message}")]
    Submission {
        function: TargetFunction,
        nonce: u64,
        message: String,
    },
}

impl RelayError {
    pub fn config(message: impl Into<String>) -> Self {
        RelayError::Config(message.into())
    }

    pub fn connection(role: ChainRole, message: impl ToString) -> Self {
        RelayError::Connection {
            role,
            message: message.to_string(),
        }
    }

    pub fn scan(role: ChainRole, message: impl ToString) -> Self {
        RelayError::Scan {
            role,
            message: message.to_string(),
        }
    }

    /// Category this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            RelayError::InvalidRole(_) | RelayError::Config(_) => ErrorCategory::Config,
            RelayError::Connection { .. } | RelayError::ChainIdMismatch { .. } => {
                ErrorCategory::Connection
            }
            RelayError::Scan { .. } => ErrorCategory::Scan,
            RelayError::Submission { .. } => ErrorCategory::Submission,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            RelayError::InvalidRole("bsc".into()).category(),
            ErrorCategory::Config
        );
        assert_eq!(
            RelayError::ChainIdMismatch {
                role: ChainRole::Source,
                expected: 43113,
                actual: 97,
            }
            .category(),
            ErrorCategory::Connection
        );
        assert_eq!(
            RelayError::scan(ChainRole::Destination, "bad log").category(),
            ErrorCategory::Scan
        );
    }

    #[test]
    fn test_submission_category() {
        let submission = RelayError::Submission {
            function: TargetFunction::Wrap,
            nonce: 7,
            message: "nonce too low".into(),
        };
        assert_eq!(submission.category(), ErrorCategory::Submission);
        assert_eq!(
            submission.to_string(),
            "Submission of wrap (nonce 7) failed: nonce too low"
        );
        assert_eq!(
            RelayError::connection(ChainRole::Source, "refused").category(),
            ErrorCategory::Connection
        );
    }

    #[test]
    fn test_invalid_role_message() {
        let err = RelayError::InvalidRole("bsc".into());
        assert_eq!(
            err.to_string(),
            "Invalid chain: bsc (expected 'source' or 'destination')"
        );
    }
}
