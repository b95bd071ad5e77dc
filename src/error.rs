//! Error types for bayescmd

use crate::config::UsageError;
use crate::dispatch::PolicyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Service error: {0}")]
    Service(String),
}

impl Error {
    /// Process exit code reported for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Usage(_) => ErrorCode::Usage,
            Error::Policy(PolicyError::MissingFile { .. }) => ErrorCode::NoInput,
            Error::Policy(_) => ErrorCode::Config,
            Error::ConfigError(_) => ErrorCode::DataErr,
            Error::Io(_) | Error::Service(_) => ErrorCode::Software,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes, following the sysexits convention used by the inference engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok = 0,
    Usage = 64,
    DataErr = 65,
    NoInput = 66,
    Software = 70,
    Config = 78,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            64 => Some(Self::Usage),
            65 => Some(Self::DataErr),
            66 => Some(Self::NoInput),
            70 => Some(Self::Software),
            78 => Some(Self::Config),
            _ => None,
        }
    }
}

impl From<ErrorCode> for std::process::ExitCode {
    fn from(code: ErrorCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}
