//! Sync adapters push a finished backup artifact to a remote destination and
//! optionally prune old remote copies.
//!
//! Every adapter follows the same lifecycle: [`SyncAdapter::setup`] validates
//! raw options, then [`SyncAdapter::sync`] performs the transfer or
//! [`SyncAdapter::simulate`] narrates it without any network I/O. Progress is
//! reported through a [`ResultSink`]. [`FtpSync`] is the FTP implementation.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::options::{ConfigurationError, RawOptions};
use crate::remote::{RemoteFile, TransportError};

mod ftp;

pub use ftp::FtpSync;

/// A finished backup artifact handed to an adapter. Read-only to adapters.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Target {
    local_path: Utf8PathBuf,
    remote_name: String,
    name_prefix: Option<String>,
}

impl Target {
    /// Describes an artifact at `local_path` to be stored as `remote_name`.
    #[must_use]
    pub fn new(local_path: impl Into<Utf8PathBuf>, remote_name: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_name: remote_name.into(),
            name_prefix: None,
        }
    }

    /// Restricts cleanup candidates to remote files whose names start with
    /// `prefix`.
    #[must_use]
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Returns the local artifact path.
    #[must_use]
    pub fn local_path(&self) -> &Utf8Path {
        &self.local_path
    }

    /// Returns the file name used on the remote side.
    #[must_use]
    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    /// Returns the cleanup name prefix, if any.
    #[must_use]
    pub fn name_prefix(&self) -> Option<&str> {
        self.name_prefix.as_deref()
    }

    /// Returns `true` when `file` belongs to this target's backup series.
    #[must_use]
    pub fn owns(&self, file: &RemoteFile) -> bool {
        self.name_prefix
            .as_deref()
            .is_none_or(|prefix| file.name.starts_with(prefix))
    }
}

/// Receiver of adapter progress messages. Implementations must not fail.
pub trait ResultSink {
    /// Records a debug message.
    fn debug(&mut self, message: &str);
}

/// [`ResultSink`] that forwards messages to `tracing` at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ResultSink for TracingSink {
    fn debug(&mut self, message: &str) {
        tracing::debug!(target: "backup_sync::result", "{message}");
    }
}

/// Step of a sync call during which the transport failed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SyncStage {
    /// Creating the client or logging in.
    Connect,
    /// Transferring the artifact.
    Upload,
    /// Entering the remote directory for cleanup.
    ChangeDirectory,
    /// Listing the remote directory.
    List,
    /// Removing an obsolete file.
    Delete,
}

impl SyncStage {
    /// Wraps a transport failure with this stage.
    #[must_use]
    pub const fn fail(self, source: TransportError) -> SyncError {
        SyncError::Transport {
            stage: self,
            source,
        }
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connect => "connect",
            Self::Upload => "upload",
            Self::ChangeDirectory => "change directory",
            Self::List => "listing",
            Self::Delete => "delete",
        };
        f.write_str(label)
    }
}

/// Errors raised while syncing a target.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SyncError {
    /// The transport failed; no later stage ran.
    #[error("sync {stage} failed: {source}")]
    Transport {
        /// Stage that failed.
        stage: SyncStage,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },
    /// `sync` was called without a successful `setup`.
    #[error("sync adapter has not been set up")]
    NotSetUp,
}

impl SyncError {
    /// Returns the failed stage for transport errors.
    #[must_use]
    pub const fn stage(&self) -> Option<SyncStage> {
        match self {
            Self::Transport { stage, .. } => Some(*stage),
            Self::NotSetUp => None,
        }
    }
}

/// Any failure an adapter can report to the orchestration tool.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AdapterError {
    /// Options were rejected or the adapter was not set up.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The transfer or cleanup failed.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Whether a run transfers data or only reports what it would do.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SyncMode {
    /// Perform the upload and cleanup.
    #[default]
    Sync,
    /// Report intended actions without network I/O.
    Simulate,
}

/// Common contract of every sync destination.
pub trait SyncAdapter {
    /// Validates `options` and keeps them for later calls. A failed setup
    /// discards any previously accepted options.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] describing the first problem found.
    fn setup(&mut self, options: &RawOptions) -> Result<(), ConfigurationError>;

    /// Transfers `target` and applies any configured cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotSetUp`] without a prior setup, or
    /// [`SyncError::Transport`] when any remote step fails.
    fn sync(&self, target: &Target, sink: &mut dyn ResultSink) -> Result<(), SyncError>;

    /// Reports what [`SyncAdapter::sync`] would do without touching the
    /// network.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NotSetUp`] without a prior setup.
    fn simulate(&self, target: &Target, sink: &mut dyn ResultSink)
    -> Result<(), ConfigurationError>;

    /// Sets up the adapter and runs it in `mode`.
    ///
    /// # Errors
    ///
    /// Returns an [`AdapterError`] wrapping the setup or sync failure.
    fn run(
        &mut self,
        options: &RawOptions,
        target: &Target,
        sink: &mut dyn ResultSink,
        mode: SyncMode,
    ) -> Result<(), AdapterError> {
        self.setup(options)?;
        match mode {
            SyncMode::Sync => self.sync(target, sink)?,
            SyncMode::Simulate => self.simulate(target, sink)?,
        }
        Ok(())
    }
}
