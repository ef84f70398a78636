//! FTP sync adapter.

use tracing::{debug, info, warn};

use super::{ResultSink, SyncAdapter, SyncError, SyncStage, Target};
use crate::cleanup::{CleanupRule, select_obsolete};
use crate::config::FtpToolConfig;
use crate::options::{ConfigurationError, RawOptions, SyncOptions};
use crate::remote::{ClientFactory, CurlClientFactory, RemoteFile, RemoteTransferClient};
use crate::runner::ProcessCommandRunner;

/// Uploads backups to an FTP server and prunes old remote copies.
///
/// Clients come from the injected [`ClientFactory`]; each `sync` call creates,
/// uses and closes its own client, so one adapter may serve several targets
/// one after another without sharing connection state.
#[derive(Debug)]
pub struct FtpSync<F: ClientFactory = CurlClientFactory<ProcessCommandRunner>> {
    factory: F,
    options: Option<SyncOptions>,
}

impl FtpSync {
    /// Creates an adapter backed by the system `curl` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_factory(CurlClientFactory::default())
    }

    /// Creates an adapter backed by the system `curl` using `tool` settings.
    #[must_use]
    pub const fn with_tool_config(tool: FtpToolConfig) -> Self {
        Self::with_factory(CurlClientFactory::with_process_runner(tool))
    }
}

impl Default for FtpSync {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ClientFactory> FtpSync<F> {
    /// Creates an adapter that obtains clients from `factory`.
    #[must_use]
    pub const fn with_factory(factory: F) -> Self {
        Self {
            factory,
            options: None,
        }
    }

    /// Returns the options accepted by the last successful setup.
    #[must_use]
    pub const fn options(&self) -> Option<&SyncOptions> {
        self.options.as_ref()
    }

    fn prune(
        session: &mut Session<F::Client>,
        options: &SyncOptions,
        rule: &CleanupRule,
        target: &Target,
        sink: &mut dyn ResultSink,
    ) -> Result<(), SyncError> {
        sink.debug(&format!(
            "ftp remote cleanup: {rule} in {}",
            options.remote_path()
        ));

        let client = session.client();
        client
            .change_directory(options.remote_path())
            .map_err(|err| SyncStage::ChangeDirectory.fail(err))?;
        let listing: Vec<RemoteFile> = client
            .list_files()
            .map_err(|err| SyncStage::List.fail(err))?
            .into_iter()
            .filter(|file| target.owns(file))
            .collect();

        let obsolete = select_obsolete(&listing, rule);
        debug!(
            listed = listing.len(),
            obsolete = obsolete.len(),
            "evaluated remote retention"
        );
        for file in &obsolete {
            client
                .delete_file(&file.name)
                .map_err(|err| SyncStage::Delete.fail(err))?;
        }
        if !obsolete.is_empty() {
            info!(
                removed = obsolete.len(),
                path = options.remote_path(),
                "pruned obsolete remote backups"
            );
        }
        Ok(())
    }
}

impl<F: ClientFactory> SyncAdapter for FtpSync<F> {
    fn setup(&mut self, options: &RawOptions) -> Result<(), ConfigurationError> {
        self.options = None;
        let validated = SyncOptions::from_raw(options)?;
        debug!(endpoint = %validated.endpoint(), path = validated.remote_path(), "ftp sync configured");
        self.options = Some(validated);
        Ok(())
    }

    fn sync(&self, target: &Target, sink: &mut dyn ResultSink) -> Result<(), SyncError> {
        let options = self.options.as_ref().ok_or(SyncError::NotSetUp)?;
        let endpoint = options.endpoint();
        sink.debug(&format!(
            "ftp upload {} -> {}:{}/{}",
            target.local_path(),
            endpoint.host,
            options.remote_path(),
            target.remote_name()
        ));

        let client = self
            .factory
            .create_client(endpoint)
            .map_err(|err| SyncStage::Connect.fail(err))?;
        let mut session = Session::connect(client).map_err(|err| SyncStage::Connect.fail(err))?;
        session
            .client()
            .upload_file(target.local_path(), options.remote_path(), target.remote_name())
            .map_err(|err| SyncStage::Upload.fail(err))?;
        debug!(remote_name = target.remote_name(), "ftp upload done");

        if let Some(rule) = options.cleanup() {
            Self::prune(&mut session, options, rule, target, sink)?;
        }
        Ok(())
    }

    fn simulate(
        &self,
        target: &Target,
        sink: &mut dyn ResultSink,
    ) -> Result<(), ConfigurationError> {
        let options = self.options.as_ref().ok_or(ConfigurationError::NotSetUp)?;
        let destination = format!(
            "{}:{}/{}",
            options.endpoint(),
            options.remote_path(),
            target.remote_name()
        );
        let message = match options.cleanup() {
            Some(rule) => format!(
                "sync backup to ftp server {destination} and run remote cleanup: {rule}"
            ),
            None => format!("sync backup to ftp server {destination}"),
        };
        sink.debug(&message);
        Ok(())
    }
}

/// Connected client that is closed when dropped, on success and error paths
/// alike.
struct Session<C: RemoteTransferClient> {
    client: C,
}

impl<C: RemoteTransferClient> Session<C> {
    fn connect(mut client: C) -> Result<Self, crate::remote::TransportError> {
        client.connect()?;
        Ok(Self { client })
    }

    fn client(&mut self) -> &mut C {
        &mut self.client
    }
}

impl<C: RemoteTransferClient> Drop for Session<C> {
    fn drop(&mut self) {
        if let Err(err) = self.client.close() {
            warn!(error = %err, "failed to close ftp session");
        }
    }
}
