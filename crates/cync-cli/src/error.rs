//! CLI error type: wraps [`cync_core::CoreError`] plus a couple of
//! host-side failures (prompting, bad input) that have no domain
//! counterpart, and maps both to a process exit code.

use thiserror::Error;

use cync_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("password required: pass --password, set CYNC_PASSWORD, or run in an interactive terminal")]
    NoPassword,

    #[error("could not read the two-factor code: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("invalid rgb value '{0}', expected \"r,g,b\" with each channel 0-255")]
    InvalidRgb(String),
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Core(CoreError::InvalidAuth | CoreError::TwoFactorRequired) => exit_code::AUTH,
            Self::Core(CoreError::NotFound(_)) => exit_code::NOT_FOUND,
            Self::Core(CoreError::CommandTimeout) => exit_code::TIMEOUT,
            Self::InvalidRgb(_) => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}
