//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::ffi::OsString;
use std::fmt;
use std::rc::Rc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::adapter::ResultSink;
use crate::remote::{ClientFactory, FtpEndpoint, RemoteFile, RemoteTransferClient, TransportError};
use crate::runner::{CommandOutput, CommandRunner};

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic command outcomes without spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<CommandOutput>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }

    /// Returns `true` when `needle` appears as a whole argument.
    #[must_use]
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|arg| arg.to_string_lossy() == needle)
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Pushes a successful exit status.
    pub fn push_success(&self) {
        self.push_output(Some(0), "", "");
    }

    /// Pushes a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32) {
        self.push_output(Some(code), "", "simulated failure");
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, TransportError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| TransportError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Result sink that keeps every debug message for later assertions.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<String>>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded debug messages.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    /// Returns how many debug messages were recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns `true` when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl ResultSink for RecordingSink {
    fn debug(&mut self, message: &str) {
        self.events.borrow_mut().push(message.to_owned());
    }
}

/// Operations exposed by [`RemoteTransferClient`], used to script failures.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TransferOperation {
    /// [`RemoteTransferClient::connect`].
    Connect,
    /// [`RemoteTransferClient::change_directory`].
    ChangeDirectory,
    /// [`RemoteTransferClient::upload_file`].
    Upload,
    /// [`RemoteTransferClient::list_files`].
    List,
    /// [`RemoteTransferClient::delete_file`].
    Delete,
    /// [`RemoteTransferClient::close`].
    Close,
}

impl fmt::Display for TransferOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connect => "connect",
            Self::ChangeDirectory => "change directory",
            Self::Upload => "upload",
            Self::List => "list",
            Self::Delete => "delete",
            Self::Close => "close",
        };
        f.write_str(label)
    }
}

/// A call observed by [`FakeTransferClient`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransferCall {
    /// Session opened.
    Connect,
    /// Working directory changed to the contained path.
    ChangeDirectory(String),
    /// File uploaded.
    Upload {
        /// Local artifact path.
        local: Utf8PathBuf,
        /// Remote directory.
        remote_dir: String,
        /// Remote file name.
        remote_name: String,
    },
    /// Working directory listed.
    List,
    /// File deleted by name.
    Delete(String),
    /// Session closed.
    Close,
}

impl TransferCall {
    /// Returns the operation this call exercised.
    #[must_use]
    pub const fn operation(&self) -> TransferOperation {
        match self {
            Self::Connect => TransferOperation::Connect,
            Self::ChangeDirectory(_) => TransferOperation::ChangeDirectory,
            Self::Upload { .. } => TransferOperation::Upload,
            Self::List => TransferOperation::List,
            Self::Delete(_) => TransferOperation::Delete,
            Self::Close => TransferOperation::Close,
        }
    }
}

#[derive(Debug, Default)]
struct FakeRemote {
    calls: Vec<TransferCall>,
    listing: Vec<RemoteFile>,
    failures: BTreeSet<TransferOperation>,
    endpoints: Vec<FtpEndpoint>,
}

/// In-memory remote server acting as a [`ClientFactory`].
///
/// Every client it creates shares one call journal and one listing, so tests
/// can inspect what a sync call did after the client has been dropped.
/// Deleting a file removes it from the listing; uploads are journalled only.
#[derive(Clone, Debug, Default)]
pub struct FakeTransport {
    remote: Rc<RefCell<FakeRemote>>,
}

impl FakeTransport {
    /// Creates a remote with an empty listing and no scripted failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the listing returned by `list_files`.
    #[must_use]
    pub fn with_listing(self, listing: Vec<RemoteFile>) -> Self {
        self.remote.borrow_mut().listing = listing;
        self
    }

    /// Makes every future call of `operation` fail.
    #[must_use]
    pub fn failing_on(self, operation: TransferOperation) -> Self {
        self.remote.borrow_mut().failures.insert(operation);
        self
    }

    /// Returns every call observed so far, across all clients.
    #[must_use]
    pub fn calls(&self) -> Vec<TransferCall> {
        self.remote.borrow().calls.clone()
    }

    /// Counts the calls of a given operation.
    #[must_use]
    pub fn count(&self, operation: TransferOperation) -> usize {
        self.remote
            .borrow()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Returns the names of deleted files in deletion order.
    #[must_use]
    pub fn deleted(&self) -> Vec<String> {
        self.remote
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransferCall::Delete(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the current remote listing.
    #[must_use]
    pub fn listing(&self) -> Vec<RemoteFile> {
        self.remote.borrow().listing.clone()
    }

    /// Returns the endpoints clients were created for.
    #[must_use]
    pub fn endpoints(&self) -> Vec<FtpEndpoint> {
        self.remote.borrow().endpoints.clone()
    }
}

impl ClientFactory for FakeTransport {
    type Client = FakeTransferClient;

    fn create_client(&self, endpoint: &FtpEndpoint) -> Result<Self::Client, TransportError> {
        self.remote.borrow_mut().endpoints.push(endpoint.clone());
        Ok(FakeTransferClient {
            remote: Rc::clone(&self.remote),
        })
    }
}

/// Client handed out by [`FakeTransport`].
#[derive(Debug)]
pub struct FakeTransferClient {
    remote: Rc<RefCell<FakeRemote>>,
}

impl FakeTransferClient {
    fn record(&self, call: TransferCall) -> Result<(), TransportError> {
        let operation = call.operation();
        let mut remote = self.remote.borrow_mut();
        remote.calls.push(call);
        if remote.failures.contains(&operation) {
            return Err(TransportError::Rejected {
                message: format!("simulated {operation} failure"),
            });
        }
        Ok(())
    }
}

impl RemoteTransferClient for FakeTransferClient {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.record(TransferCall::Connect)
    }

    fn change_directory(&mut self, path: &str) -> Result<(), TransportError> {
        self.record(TransferCall::ChangeDirectory(path.to_owned()))
    }

    fn upload_file(
        &mut self,
        local: &Utf8Path,
        remote_dir: &str,
        remote_name: &str,
    ) -> Result<(), TransportError> {
        self.record(TransferCall::Upload {
            local: local.to_path_buf(),
            remote_dir: remote_dir.to_owned(),
            remote_name: remote_name.to_owned(),
        })
    }

    fn list_files(&mut self) -> Result<Vec<RemoteFile>, TransportError> {
        self.record(TransferCall::List)?;
        Ok(self.remote.borrow().listing.clone())
    }

    fn delete_file(&mut self, name: &str) -> Result<(), TransportError> {
        self.record(TransferCall::Delete(name.to_owned()))?;
        self.remote
            .borrow_mut()
            .listing
            .retain(|file| file.name != name);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.record(TransferCall::Close)
    }
}
