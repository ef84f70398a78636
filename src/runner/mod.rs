//! Command runner abstraction used by the curl-backed FTP transport.
//!
//! Failed runs are reported with curl's exit code and, for the codes an FTP
//! transfer commonly hits, a short reason.

use std::ffi::OsString;
use std::process::{Command, Stdio};

use crate::remote::TransportError;

/// Result of running an external command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// Converts a non-zero exit into [`TransportError::CommandFailure`],
    /// labelling well-known curl exit codes.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::CommandFailure`] when the command did not
    /// exit with status zero.
    pub fn into_success(self, program: &str) -> Result<Self, TransportError> {
        if self.is_success() {
            return Ok(self);
        }

        let status_text = self.code.map_or_else(
            || String::from("unknown"),
            |code| match curl_exit_reason(code) {
                Some(reason) => format!("{code} ({reason})"),
                None => code.to_string(),
            },
        );
        Err(TransportError::CommandFailure {
            program: program.to_owned(),
            status: self.code,
            status_text,
            stderr: self.stderr.trim().to_owned(),
        })
    }
}

/// Reason for curl exit codes that FTP syncs run into.
const fn curl_exit_reason(code: i32) -> Option<&'static str> {
    match code {
        6 => Some("could not resolve host"),
        7 => Some("failed to connect"),
        9 => Some("remote access denied"),
        21 => Some("quote command rejected"),
        25 => Some("upload refused"),
        26 => Some("local file unreadable"),
        28 => Some("timed out"),
        67 => Some("login denied"),
        78 => Some("remote file not found"),
        _ => None,
    }
}

/// Abstraction over command execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `program` with the given arguments, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Spawn`] if the command cannot be started.
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, TransportError>;
}

/// Runs programs on the host with stdin closed, so a transfer can never
/// block on an interactive prompt.
#[derive(Clone, Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, TransportError> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| TransportError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
