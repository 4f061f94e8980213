//! Error types for interface, key and peer operations.
//!
//! Every fallible operation in this crate returns [`Result`], carrying either
//! the success value or exactly one [`WgError`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for `wgmgr` operations.
pub type Result<T> = std::result::Result<T, WgError>;

/// Errors that can occur while driving the `WireGuard` tools.
#[derive(Debug, Error)]
pub enum WgError {
    /// An external command failed to spawn or exited non-zero.
    #[error("command `{command}` failed: {reason}")]
    CommandExecution {
        /// The command line that was executed (stdin payload excluded).
        command: String,
        /// Exit code, if the process ran to completion.
        exit_code: Option<i32>,
        /// Combined stdout and stderr captured before the failure.
        output: String,
        /// Short description of the failure.
        reason: String,
        /// Underlying OS error, if the process could not be run.
        #[source]
        source: Option<io::Error>,
    },

    /// Reading or writing a key or config file failed.
    #[error("file I/O failed on {}: {source}", .path.display())]
    FileIo {
        /// The file involved.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The operation was cancelled before the external command finished.
    #[error("command `{command}` cancelled")]
    Cancelled {
        /// The command that was in flight.
        command: String,
    },

    /// A key or interface name cannot be used as a keystore file name.
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Settings could not be loaded or are invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl WgError {
    /// Creates a `CommandExecution` error for a process that could not be run.
    #[must_use]
    pub fn spawn_failed(command: impl Into<String>, source: io::Error) -> Self {
        Self::CommandExecution {
            command: command.into(),
            exit_code: None,
            output: String::new(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a `CommandExecution` error for a pipe failure mid-run.
    #[must_use]
    pub fn io_failed(command: impl Into<String>, output: &[u8], source: io::Error) -> Self {
        Self::CommandExecution {
            command: command.into(),
            exit_code: None,
            output: String::from_utf8_lossy(output).into_owned(),
            reason: format!("i/o error while running: {source}"),
            source: Some(source),
        }
    }

    /// Creates a `CommandExecution` error for a non-zero exit.
    ///
    /// `exit_code` is `None` when the process was terminated by a signal.
    #[must_use]
    pub fn non_zero_exit(command: impl Into<String>, exit_code: Option<i32>, output: &[u8]) -> Self {
        let reason = match exit_code {
            Some(code) => format!("exited with code {code}"),
            None => "terminated by signal".to_string(),
        };
        Self::CommandExecution {
            command: command.into(),
            exit_code,
            output: String::from_utf8_lossy(output).into_owned(),
            reason,
            source: None,
        }
    }

    /// Creates a `FileIo` error.
    #[must_use]
    pub fn file_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Creates a `Cancelled` error.
    #[must_use]
    pub fn cancelled(command: impl Into<String>) -> Self {
        Self::Cancelled {
            command: command.into(),
        }
    }

    /// Creates an `InvalidName` error.
    #[must_use]
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for the cancellation-class error.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns `true` if an external command failed to spawn or exited non-zero.
    #[must_use]
    pub fn is_command_failure(&self) -> bool {
        matches!(self, Self::CommandExecution { .. })
    }

    /// Combined output of the failed command, if any was captured.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandExecution { output, .. } if !output.is_empty() => Some(output),
            _ => None,
        }
    }

    /// Exit code of the failed command, if it ran to completion.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandExecution { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}
