//! Remote transfer capability consumed by sync adapters.
//!
//! [`RemoteTransferClient`] is the narrow protocol surface the FTP adapter
//! drives: connect, change directory, upload, list and delete. Clients are
//! produced through a [`ClientFactory`] so the transport can be replaced by a
//! fake in tests. [`CurlFtpClient`] is the production implementation and
//! drives the system `curl` binary through a
//! [`CommandRunner`](crate::runner::CommandRunner).

use std::fmt;

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use thiserror::Error;

mod curl;
mod mlsd;

pub use curl::{CurlClientFactory, CurlFtpClient};
pub use mlsd::parse_mlsd_listing;

/// Default control port for FTP servers.
pub const DEFAULT_FTP_PORT: u16 = 21;

/// Connection details for a single FTP server account.
#[derive(Clone, Eq, PartialEq)]
pub struct FtpEndpoint {
    /// Hostname or IP address of the server.
    pub host: String,
    /// Control connection port.
    pub port: u16,
    /// Login name.
    pub user: String,
    /// Login password. Never rendered by `Debug`.
    pub password: String,
    /// Whether to use passive mode data connections.
    pub passive: bool,
}

impl fmt::Debug for FtpEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("passive", &self.passive)
            .finish()
    }
}

impl fmt::Display for FtpEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.host)?;
        if self.port != DEFAULT_FTP_PORT {
            write!(f, ":{}", self.port)?;
        }
        Ok(())
    }
}

/// A plain file found in a remote directory listing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteFile {
    /// File name relative to the listed directory.
    pub name: String,
    /// Size in bytes when the server reports it.
    pub size: Option<u64>,
    /// Last modification time when the server reports it.
    pub modified: Option<DateTime<Utc>>,
}

impl RemoteFile {
    /// Creates an entry that carries only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            modified: None,
        }
    }

    /// Sets the reported size.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the reported modification time.
    #[must_use]
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }
}

/// Errors surfaced by a transfer client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TransportError {
    /// Raised when a command cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when the transfer program exits with a non-zero status.
    #[error("{program} exited with status {status_text}: {stderr}")]
    CommandFailure {
        /// Command name used for the attempted operation.
        program: String,
        /// Exit status as reported by the OS.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the process.
        stderr: String,
    },
    /// Raised when the local artifact to upload does not exist.
    #[error("local file missing: {path}")]
    MissingLocalFile {
        /// Path that was expected to be uploaded.
        path: Utf8PathBuf,
    },
    /// Raised when a remote file name could escape its directory or break
    /// the control connection.
    #[error("invalid remote file name: {name:?}")]
    InvalidRemoteName {
        /// Offending name.
        name: String,
    },
    /// Raised when a remote directory contains control characters.
    #[error("invalid remote directory: {path:?}")]
    InvalidRemoteDirectory {
        /// Offending directory.
        path: String,
    },
    /// Raised when an operation is attempted outside a connected session.
    #[error("transfer client is not connected")]
    NotConnected,
    /// Raised when a directory listing cannot be interpreted.
    #[error("unreadable directory listing: {message}")]
    Listing {
        /// Parser error message.
        message: String,
    },
    /// Raised by client implementations for protocol level refusals.
    #[error("remote server rejected the request: {message}")]
    Rejected {
        /// Message reported by the client.
        message: String,
    },
}

/// Protocol client capable of pushing files to, and pruning files on, a
/// remote server.
///
/// Remote paths are relative to the login directory of the account. A client
/// is owned by exactly one sync call and is never shared.
pub trait RemoteTransferClient {
    /// Opens the session and authenticates.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the server is unreachable or rejects
    /// the credentials.
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Changes the working directory used by [`list_files`] and
    /// [`delete_file`].
    ///
    /// [`list_files`]: RemoteTransferClient::list_files
    /// [`delete_file`]: RemoteTransferClient::delete_file
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the directory cannot be entered.
    fn change_directory(&mut self, path: &str) -> Result<(), TransportError>;

    /// Uploads `local` into `remote_dir` as `remote_name`, creating missing
    /// directories.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the transfer fails.
    fn upload_file(
        &mut self,
        local: &camino::Utf8Path,
        remote_dir: &str,
        remote_name: &str,
    ) -> Result<(), TransportError>;

    /// Lists the plain files in the working directory in server order.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the listing fails or is unreadable.
    fn list_files(&mut self) -> Result<Vec<RemoteFile>, TransportError>;

    /// Deletes `name` from the working directory.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the deletion fails.
    fn delete_file(&mut self, name: &str) -> Result<(), TransportError>;

    /// Ends the session.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the server does not acknowledge the
    /// logout.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Creates transfer clients for a given endpoint.
pub trait ClientFactory {
    /// Client type produced by this factory.
    type Client: RemoteTransferClient;

    /// Builds an unconnected client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the client cannot be constructed.
    fn create_client(&self, endpoint: &FtpEndpoint) -> Result<Self::Client, TransportError>;
}

/// Rejects names that are empty, traverse directories, or contain control
/// line breaks.
pub(crate) fn validate_remote_name(name: &str) -> Result<(), TransportError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\r', '\n']);
    if invalid {
        return Err(TransportError::InvalidRemoteName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// Rejects directories that would break the control connection.
pub(crate) fn validate_remote_directory(path: &str) -> Result<(), TransportError> {
    if path.chars().any(char::is_control) {
        return Err(TransportError::InvalidRemoteDirectory {
            path: path.to_owned(),
        });
    }
    Ok(())
}
