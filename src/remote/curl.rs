//! FTP transfer client that drives the system `curl` binary.
//!
//! Every operation is a separate `curl` invocation, so the "session" is
//! logical: [`CurlFtpClient::connect`] verifies the login and later calls are
//! refused once [`CurlFtpClient::close`] has run.

use std::ffi::OsString;

use camino::Utf8Path;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use tracing::debug;

use super::{
    ClientFactory, FtpEndpoint, RemoteFile, RemoteTransferClient, TransportError,
    parse_mlsd_listing, validate_remote_directory, validate_remote_name,
};
use crate::config::FtpToolConfig;
use crate::runner::{CommandRunner, ProcessCommandRunner};

/// Characters escaped inside a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Builds [`CurlFtpClient`] instances sharing one runner and tool config.
#[derive(Clone, Debug)]
pub struct CurlClientFactory<R: CommandRunner + Clone> {
    tool: FtpToolConfig,
    runner: R,
}

impl CurlClientFactory<ProcessCommandRunner> {
    /// Convenience constructor that wires the real process runner.
    #[must_use]
    pub const fn with_process_runner(tool: FtpToolConfig) -> Self {
        Self::new(tool, ProcessCommandRunner)
    }
}

impl Default for CurlClientFactory<ProcessCommandRunner> {
    fn default() -> Self {
        Self::with_process_runner(FtpToolConfig::default())
    }
}

impl<R: CommandRunner + Clone> CurlClientFactory<R> {
    /// Creates a factory using the provided tool settings and runner.
    #[must_use]
    pub const fn new(tool: FtpToolConfig, runner: R) -> Self {
        Self { tool, runner }
    }
}

impl<R: CommandRunner + Clone> ClientFactory for CurlClientFactory<R> {
    type Client = CurlFtpClient<R>;

    fn create_client(&self, endpoint: &FtpEndpoint) -> Result<Self::Client, TransportError> {
        Ok(CurlFtpClient::new(
            endpoint.clone(),
            self.tool.clone(),
            self.runner.clone(),
        ))
    }
}

/// [`RemoteTransferClient`] backed by `curl` invocations.
#[derive(Debug)]
pub struct CurlFtpClient<R: CommandRunner> {
    endpoint: FtpEndpoint,
    tool: FtpToolConfig,
    runner: R,
    connected: bool,
    working_dir: String,
}

impl<R: CommandRunner> CurlFtpClient<R> {
    /// Creates an unconnected client.
    #[must_use]
    pub const fn new(endpoint: FtpEndpoint, tool: FtpToolConfig, runner: R) -> Self {
        Self {
            endpoint,
            tool,
            runner,
            connected: false,
            working_dir: String::new(),
        }
    }

    /// Returns the working directory used by listings and deletions.
    #[must_use]
    pub fn working_dir(&self) -> &str {
        &self.working_dir
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.connected {
            Ok(())
        } else {
            Err(TransportError::NotConnected)
        }
    }

    fn run_curl(&self, extra: Vec<OsString>) -> Result<String, TransportError> {
        let mut args = self.common_args();
        args.extend(extra);
        let output = self.runner.run(&self.tool.curl_bin, &args)?;
        Ok(output.into_success(&self.tool.curl_bin)?.stdout)
    }

    /// Credentials travel as `--user user:password`; curl blanks that
    /// argument in its own process arguments once it has read it, where the
    /// platform allows. User names containing `:` are refused at setup.
    fn common_args(&self) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("--silent"),
            OsString::from("--show-error"),
            OsString::from("--connect-timeout"),
            OsString::from(self.tool.connect_timeout_secs.to_string()),
            OsString::from("--user"),
            OsString::from(format!("{}:{}", self.endpoint.user, self.endpoint.password)),
        ];
        if !self.endpoint.passive {
            args.push(OsString::from("--ftp-port"));
            args.push(OsString::from("-"));
        }
        args
    }

    fn base_url(&self) -> String {
        let host = &self.endpoint.host;
        if host.contains(':') && !host.starts_with('[') {
            format!("ftp://[{host}]:{}/", self.endpoint.port)
        } else {
            format!("ftp://{host}:{}/", self.endpoint.port)
        }
    }

    fn directory_url(&self, dir: &str) -> String {
        let mut url = self.base_url();
        for segment in dir.split('/').filter(|segment| !segment.is_empty()) {
            url.push_str(&utf8_percent_encode(segment, PATH_SEGMENT).to_string());
            url.push('/');
        }
        url
    }

    fn file_url(&self, dir: &str, name: &str) -> String {
        let mut url = self.directory_url(dir);
        url.push_str(&utf8_percent_encode(name, PATH_SEGMENT).to_string());
        url
    }
}

impl<R: CommandRunner> RemoteTransferClient for CurlFtpClient<R> {
    fn connect(&mut self) -> Result<(), TransportError> {
        debug!(endpoint = %self.endpoint, "probing ftp login");
        self.run_curl(vec![
            OsString::from("--list-only"),
            OsString::from(self.base_url()),
        ])?;
        self.connected = true;
        Ok(())
    }

    fn change_directory(&mut self, path: &str) -> Result<(), TransportError> {
        self.ensure_connected()?;
        validate_remote_directory(path)?;
        path.trim_matches('/').clone_into(&mut self.working_dir);
        debug!(dir = %self.working_dir, "changed ftp working directory");
        Ok(())
    }

    fn upload_file(
        &mut self,
        local: &Utf8Path,
        remote_dir: &str,
        remote_name: &str,
    ) -> Result<(), TransportError> {
        self.ensure_connected()?;
        validate_remote_directory(remote_dir)?;
        validate_remote_name(remote_name)?;
        if !local.is_file() {
            return Err(TransportError::MissingLocalFile {
                path: local.to_path_buf(),
            });
        }

        let url = self.file_url(remote_dir, remote_name);
        debug!(%local, %url, "uploading over ftp");
        self.run_curl(vec![
            OsString::from("--ftp-create-dirs"),
            OsString::from("--upload-file"),
            OsString::from(local.as_str()),
            OsString::from(url),
        ])?;
        Ok(())
    }

    fn list_files(&mut self) -> Result<Vec<RemoteFile>, TransportError> {
        self.ensure_connected()?;
        let stdout = self.run_curl(vec![
            OsString::from("--request"),
            OsString::from("MLSD"),
            OsString::from(self.directory_url(&self.working_dir)),
        ])?;
        parse_mlsd_listing(&stdout)
    }

    fn delete_file(&mut self, name: &str) -> Result<(), TransportError> {
        self.ensure_connected()?;
        validate_remote_name(name)?;

        // Quote commands run before curl changes directory, so the path is
        // relative to the login directory.
        let target = if self.working_dir.is_empty() {
            name.to_owned()
        } else {
            format!("{}/{name}", self.working_dir)
        };
        debug!(%target, "deleting remote file");
        self.run_curl(vec![
            OsString::from("--quote"),
            OsString::from(format!("DELE {target}")),
            OsString::from("--list-only"),
            OsString::from(self.directory_url(&self.working_dir)),
        ])?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.connected = false;
        self.working_dir.clear();
        Ok(())
    }
}
