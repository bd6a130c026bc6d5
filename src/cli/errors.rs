//! CLI-specific error types

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::table::AccessError;
use crate::upload::UploadError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration could not be loaded
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Table or signer could not be constructed
    SetupFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CLI_CONFIG_ERROR",
            Self::IoError => "CLI_IO_ERROR",
            Self::SetupFailed => "CLI_SETUP_FAILED",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn setup_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::SetupFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(CliErrorCode::ConfigError, e.to_string())
    }
}

impl From<AccessError> for CliError {
    fn from(e: AccessError) -> Self {
        Self::setup_failed(e.to_string())
    }
}

impl From<UploadError> for CliError {
    fn from(e: UploadError) -> Self {
        Self::setup_failed(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
