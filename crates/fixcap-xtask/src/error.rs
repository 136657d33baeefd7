//! Task runner errors and exit codes.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use thiserror::Error;

use crate::config::ConfigError;

/// Process exit codes for failures that do not come from a child process.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    IoError = 3,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

/// Errors produced while running a recipe.
#[derive(Debug, Error)]
pub enum XtaskError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` {}", describe_exit(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("working tree is not clean ({entries} uncommitted change(s)); commit or stash first")]
    DirtyWorkingTree { entries: usize },

    #[error("pre-commit hook source not found: {path}")]
    HookSourceMissing { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to initialize logging: {0}")]
    Logging(String),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("failed with exit code {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

impl XtaskError {
    /// Status to exit the process with for this error.
    ///
    /// A failing tool's own exit code is passed through unchanged.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::CommandFailed {
                code: Some(code), ..
            } => match u8::try_from(*code) {
                Ok(0) | Err(_) => Exit::GeneralError as u8,
                Ok(code) => code,
            },
            Self::Config(_) => Exit::ConfigError as u8,
            Self::Io { .. } | Self::HookSourceMissing { .. } => Exit::IoError as u8,
            _ => Exit::GeneralError as u8,
        }
    }

    /// [`exit_status`](Self::exit_status) as an [`ExitCode`].
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}

/// Result alias for task runner operations.
pub type XtaskResult<T> = Result<T, XtaskError>;
