//! Sync adapter library for backup orchestration.
//!
//! After a backup artifact has been produced, a sync adapter pushes it to a
//! remote destination and optionally prunes old remote backups according to
//! a retention rule. The crate ships the FTP adapter ([`FtpSync`]), which
//! drives the system `curl` binary, together with the option validation and
//! cleanup selection it relies on.

pub mod adapter;
pub mod cleanup;
pub mod config;
pub mod options;
pub mod remote;
pub mod runner;
pub mod test_support;

pub use adapter::{
    AdapterError, FtpSync, ResultSink, SyncAdapter, SyncError, SyncMode, SyncStage, Target,
    TracingSink,
};
pub use cleanup::{CleanupKind, CleanupRule, select_obsolete, select_obsolete_at};
pub use config::{FtpToolConfig, ToolConfigError};
pub use options::{ConfigurationError, OptionValue, RawOptions, SyncOptions};
pub use remote::{
    ClientFactory, CurlClientFactory, CurlFtpClient, FtpEndpoint, RemoteFile,
    RemoteTransferClient, TransportError,
};
pub use runner::{CommandOutput, CommandRunner, ProcessCommandRunner};
