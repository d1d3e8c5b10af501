//! Outcome classification
//!
//! Collapses probe outcomes into the coarse vocabulary shown to operators.
//! Diagnostic detail goes to the log, never into the returned code.

use crate::core::probe::ProbeOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

/// Operator-facing error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Device unreachable or not speaking the protocol
    CannotConnect,
    /// A device with the same `host:port` is already configured
    AlreadyConfigured,
    /// Host field is empty
    InvalidHost,
}

impl ErrorCode {
    /// Wire/display form of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CannotConnect => "cannot_connect",
            Self::AlreadyConfigured => "already_configured",
            Self::InvalidHost => "invalid_host",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a probe outcome to the error an operator should see, if any
pub fn classify(outcome: &ProbeOutcome) -> Option<ErrorCode> {
    match outcome {
        ProbeOutcome::Success => None,
        ProbeOutcome::ProtocolMismatch => {
            warn!("device answered with an invalid frame");
            Some(ErrorCode::CannotConnect)
        }
        ProbeOutcome::Timeout => {
            warn!("device did not answer before the deadline");
            Some(ErrorCode::CannotConnect)
        }
        ProbeOutcome::TransportError(detail) => {
            warn!(detail = %detail, "could not reach device");
            Some(ErrorCode::CannotConnect)
        }
        ProbeOutcome::UnexpectedError(detail) => {
            error!(detail = %detail, "unexpected failure while probing device");
            Some(ErrorCode::CannotConnect)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_error() {
        assert_eq!(classify(&ProbeOutcome::Success), None);
    }

    #[test]
    fn test_failures_collapse_to_cannot_connect() {
        let failures = [
            ProbeOutcome::ProtocolMismatch,
            ProbeOutcome::Timeout,
            ProbeOutcome::TransportError("connection refused".into()),
            ProbeOutcome::UnexpectedError("codec panicked".into()),
        ];
        for outcome in &failures {
            assert_eq!(classify(outcome), Some(ErrorCode::CannotConnect), "{outcome}");
        }
    }

    #[test]
    fn test_error_code_strings() {
        assert_eq!(ErrorCode::CannotConnect.to_string(), "cannot_connect");
        assert_eq!(ErrorCode::AlreadyConfigured.as_str(), "already_configured");
        assert_eq!(
            serde_json::to_string(&ErrorCode::InvalidHost).unwrap(),
            "\"invalid_host\""
        );
    }
}
