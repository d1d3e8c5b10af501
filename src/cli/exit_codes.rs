//! CLI Exit Codes
//!
//! Exit codes for setup and probe operations, suitable for scripting.

use crate::config::ConfigError;
use crate::core::classify::ErrorCode;
use crate::core::flow::AbortReason;
use crate::core::probe::ProbeOutcome;
use crate::core::registry::StoreError;
use std::process::ExitCode;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Success
    pub const SUCCESS: u8 = 0;

    /// General error
    pub const ERROR: u8 = 1;

    /// Invalid arguments
    pub const INVALID_ARGS: u8 = 2;

    /// Connection failed
    pub const CONNECTION_FAILED: u8 = 3;

    /// Connection timeout
    pub const TIMEOUT: u8 = 4;

    /// File not found
    pub const FILE_NOT_FOUND: u8 = 6;

    /// Permission denied
    pub const PERMISSION_DENIED: u8 = 7;

    /// Configuration error
    pub const CONFIG_ERROR: u8 = 8;

    /// Protocol error
    pub const PROTOCOL_ERROR: u8 = 9;

    /// Device already configured
    pub const ALREADY_CONFIGURED: u8 = 18;

    /// Internal error
    pub const INTERNAL_ERROR: u8 = 127;
}

/// CLI operation result
#[derive(Debug)]
pub enum CliResult {
    /// Success with optional message
    Success(Option<String>),

    /// Error with code and message
    Error(u8, String),
}

impl CliResult {
    /// Plain success
    pub fn success() -> Self {
        Self::Success(None)
    }

    /// Success with a message
    pub fn success_with_message(msg: impl Into<String>) -> Self {
        Self::Success(Some(msg.into()))
    }

    /// Error with an explicit code
    pub fn error(code: u8, msg: impl Into<String>) -> Self {
        Self::Error(code, msg.into())
    }

    /// Device already configured
    pub fn already_configured(key: &str) -> Self {
        Self::Error(
            ExitCodes::ALREADY_CONFIGURED,
            format!("{} is already configured", key),
        )
    }

    /// Get exit code
    pub fn code(&self) -> u8 {
        match self {
            Self::Success(_) => ExitCodes::SUCCESS,
            Self::Error(code, _) => *code,
        }
    }

    /// Get message
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success(Some(msg)) => Some(msg),
            Self::Error(_, msg) => Some(msg),
            _ => None,
        }
    }

    /// Convert to ExitCode
    pub fn to_exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    /// Is success?
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<&ProbeOutcome> for CliResult {
    fn from(outcome: &ProbeOutcome) -> Self {
        let code = match outcome {
            ProbeOutcome::Success => return Self::success_with_message(outcome.to_string()),
            ProbeOutcome::ProtocolMismatch => ExitCodes::PROTOCOL_ERROR,
            ProbeOutcome::Timeout => ExitCodes::TIMEOUT,
            ProbeOutcome::TransportError(_) => ExitCodes::CONNECTION_FAILED,
            ProbeOutcome::UnexpectedError(_) => ExitCodes::INTERNAL_ERROR,
        };
        Self::Error(code, outcome.to_string())
    }
}

impl From<ErrorCode> for CliResult {
    fn from(code: ErrorCode) -> Self {
        let exit = match code {
            ErrorCode::CannotConnect => ExitCodes::CONNECTION_FAILED,
            ErrorCode::AlreadyConfigured => ExitCodes::ALREADY_CONFIGURED,
            ErrorCode::InvalidHost => ExitCodes::INVALID_ARGS,
        };
        Self::Error(exit, code.to_string())
    }
}

impl From<AbortReason> for CliResult {
    fn from(reason: AbortReason) -> Self {
        let code = match reason {
            AbortReason::CannotConnect => ExitCodes::CONNECTION_FAILED,
            AbortReason::AlreadySetup => ExitCodes::ALREADY_CONFIGURED,
        };
        Self::Error(code, reason.to_string())
    }
}

impl From<std::io::Error> for CliResult {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let code = match err.kind() {
            ErrorKind::NotFound => ExitCodes::FILE_NOT_FOUND,
            ErrorKind::PermissionDenied => ExitCodes::PERMISSION_DENIED,
            ErrorKind::ConnectionRefused => ExitCodes::CONNECTION_FAILED,
            ErrorKind::TimedOut => ExitCodes::TIMEOUT,
            _ => ExitCodes::ERROR,
        };

        Self::Error(code, err.to_string())
    }
}

impl From<ConfigError> for CliResult {
    fn from(err: ConfigError) -> Self {
        Self::Error(ExitCodes::CONFIG_ERROR, err.to_string())
    }
}

impl From<StoreError> for CliResult {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(key) => Self::already_configured(&key),
            StoreError::Io(e) => Self::from(e),
            other => Self::Error(ExitCodes::ERROR, other.to_string()),
        }
    }
}

/// Exit code description
pub fn exit_code_description(code: u8) -> &'static str {
    match code {
        0 => "Success",
        1 => "General error",
        2 => "Invalid arguments",
        3 => "Connection failed",
        4 => "Connection timeout",
        6 => "File not found",
        7 => "Permission denied",
        8 => "Configuration error",
        9 => "Protocol error",
        18 => "Device already configured",
        127 => "Internal error",
        _ => "Unknown error",
    }
}

/// Print exit code table
pub fn print_exit_codes() {
    println!("Exit Codes:");
    for code in [0, 1, 2, 3, 4, 6, 7, 8, 9, 18, 127] {
        println!("  {:>3}  {}", code, exit_code_description(code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_result() {
        let success = CliResult::success();
        assert!(success.is_success());
        assert_eq!(success.code(), 0);

        let error = CliResult::error(3, "Connection failed");
        assert!(!error.is_success());
        assert_eq!(error.code(), 3);
        assert_eq!(error.message(), Some("Connection failed"));
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let result = CliResult::from(err);
        assert_eq!(result.code(), ExitCodes::FILE_NOT_FOUND);
    }

    #[test]
    fn test_from_probe_outcome() {
        assert!(CliResult::from(&ProbeOutcome::Success).is_success());
        assert_eq!(
            CliResult::from(&ProbeOutcome::ProtocolMismatch).code(),
            ExitCodes::PROTOCOL_ERROR
        );
        assert_eq!(CliResult::from(&ProbeOutcome::Timeout).code(), ExitCodes::TIMEOUT);

        let refused = CliResult::from(&ProbeOutcome::TransportError("refused".into()));
        assert_eq!(refused.code(), ExitCodes::CONNECTION_FAILED);
        assert_eq!(refused.message(), Some("transport_error: refused"));

        assert_eq!(
            CliResult::from(&ProbeOutcome::UnexpectedError("boom".into())).code(),
            ExitCodes::INTERNAL_ERROR
        );
    }

    #[test]
    fn test_from_flow_codes() {
        assert_eq!(
            CliResult::from(ErrorCode::AlreadyConfigured).code(),
            ExitCodes::ALREADY_CONFIGURED
        );
        assert_eq!(CliResult::from(ErrorCode::InvalidHost).code(), ExitCodes::INVALID_ARGS);
        assert_eq!(
            CliResult::from(AbortReason::CannotConnect).message(),
            Some("cannot_connect")
        );
        assert_eq!(
            CliResult::from(AbortReason::AlreadySetup).code(),
            ExitCodes::ALREADY_CONFIGURED
        );
    }

    #[test]
    fn test_from_store_error() {
        let result = CliResult::from(StoreError::Duplicate("10.0.0.5:8080".into()));
        assert_eq!(result.code(), ExitCodes::ALREADY_CONFIGURED);
        assert_eq!(result.message(), Some("10.0.0.5:8080 is already configured"));
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(exit_code_description(18), "Device already configured");
        assert_eq!(exit_code_description(200), "Unknown error");
    }
}
