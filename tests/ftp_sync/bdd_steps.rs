//! BDD step definitions for FTP sync behaviour.

use backup_sync::test_support::{FakeTransport, TransferOperation};
use backup_sync::{FtpSync, RemoteFile, SyncAdapter, SyncError, SyncStage, Target};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{FtpContext, SyncOutcome};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn expect_count(label: &str, actual: usize, expected: u32) -> Result<(), StepError> {
    if u32::try_from(actual).is_ok_and(|value| value == expected) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {expected} {label}, got {actual}"
        )))
    }
}

fn configured_adapter(ftp_context: &FtpContext) -> FtpSync<FakeTransport> {
    let mut ftp = FtpSync::with_factory(ftp_context.transport());
    let options = ftp_context.options.borrow().clone();
    ftp.setup(&options)
        .unwrap_or_else(|err| panic!("scenario options should validate: {err}"));
    ftp
}

fn target(name: &str) -> Target {
    Target::new(format!("/var/backups/{name}"), name)
}

#[given("an ftp adapter for host \"{host}\" and path \"{path}\"")]
fn ftp_adapter_for(ftp_context: &FtpContext, host: String, path: String) {
    ftp_context.update_options(|options| {
        options
            .with("host", host.trim())
            .with("user", "user.name")
            .with("password", "secret")
            .with("path", path.trim())
    });
}

#[given("a quantity cleanup keeping {amount:u32} backups")]
fn quantity_cleanup(ftp_context: &FtpContext, amount: u32) {
    ftp_context.update_options(|options| {
        options
            .with("cleanup.type", "quantity")
            .with("cleanup.amount", i64::from(amount))
    });
}

#[given("the remote directory holds {count:u32} backups")]
fn remote_holds_backups(ftp_context: &FtpContext, count: u32) {
    let listing = (1..=count)
        .map(|n| RemoteFile::named(format!("foo-{n:02}.txt.gz")))
        .collect();
    ftp_context.update_transport(|transport| transport.with_listing(listing));
}

#[given("the remote rejects uploads")]
fn remote_rejects_uploads(ftp_context: &FtpContext) {
    ftp_context.update_transport(|transport| transport.failing_on(TransferOperation::Upload));
}

#[when("I sync the backup \"{name}\"")]
fn sync_backup(ftp_context: &FtpContext, name: String) {
    let ftp = configured_adapter(ftp_context);
    let mut sink = ftp_context.sink.clone();
    let result = ftp.sync(&target(name.trim()), &mut sink);
    *ftp_context.outcome.borrow_mut() = Some(SyncOutcome::Synced(result));
}

#[when("I simulate syncing the backup \"{name}\"")]
fn simulate_backup(ftp_context: &FtpContext, name: String) {
    let ftp = configured_adapter(ftp_context);
    let mut sink = ftp_context.sink.clone();
    ftp.simulate(&target(name.trim()), &mut sink)
        .unwrap_or_else(|err| panic!("simulate should succeed: {err}"));
    *ftp_context.outcome.borrow_mut() = Some(SyncOutcome::Simulated);
}

#[then("the sync succeeds")]
fn sync_succeeds(ftp_context: &FtpContext) -> Result<(), StepError> {
    match ftp_context.outcome.borrow().as_ref() {
        Some(SyncOutcome::Synced(Ok(()))) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a successful sync, got {other:?}"
        ))),
    }
}

#[then("the sync fails during upload")]
fn sync_fails_during_upload(ftp_context: &FtpContext) -> Result<(), StepError> {
    match ftp_context.outcome.borrow().as_ref() {
        Some(SyncOutcome::Synced(Err(err @ SyncError::Transport { .. })))
            if err.stage() == Some(SyncStage::Upload) =>
        {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected an upload failure, got {other:?}"
        ))),
    }
}

#[then("the upload count is {count:u32}")]
fn upload_count(ftp_context: &FtpContext, count: u32) -> Result<(), StepError> {
    let uploads = ftp_context.transport().count(TransferOperation::Upload);
    expect_count("uploads", uploads, count)
}

#[then("the listing count is {count:u32}")]
fn listing_count(ftp_context: &FtpContext, count: u32) -> Result<(), StepError> {
    let listings = ftp_context.transport().count(TransferOperation::List);
    expect_count("listings", listings, count)
}

#[then("the deleted backup count is {count:u32}")]
fn deleted_count(ftp_context: &FtpContext, count: u32) -> Result<(), StepError> {
    let deleted = ftp_context.transport().deleted().len();
    expect_count("deletions", deleted, count)
}

#[then("the debug event count is {count:u32}")]
fn debug_event_count(ftp_context: &FtpContext, count: u32) -> Result<(), StepError> {
    expect_count("debug events", ftp_context.sink.len(), count)
}

#[then("no transport call was made")]
fn no_transport_calls(ftp_context: &FtpContext) -> Result<(), StepError> {
    let calls = ftp_context.transport().calls();
    if calls.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no transport calls, got {calls:?}"
        )))
    }
}
