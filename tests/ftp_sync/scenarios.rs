//! BDD scenarios for the FTP sync adapter.

use rstest_bdd_macros::scenario;

use super::test_helpers::{FtpContext, ftp_context};

#[scenario(
    path = "tests/features/ftp_sync.feature",
    name = "Upload a backup without cleanup"
)]
fn scenario_upload_without_cleanup(ftp_context: FtpContext) {
    let _ = ftp_context;
}

#[scenario(
    path = "tests/features/ftp_sync.feature",
    name = "Prune surplus backups after uploading"
)]
fn scenario_prune_surplus(ftp_context: FtpContext) {
    let _ = ftp_context;
}

#[scenario(
    path = "tests/features/ftp_sync.feature",
    name = "Announce cleanup even when nothing is obsolete"
)]
fn scenario_announce_empty_cleanup(ftp_context: FtpContext) {
    let _ = ftp_context;
}

#[scenario(
    path = "tests/features/ftp_sync.feature",
    name = "Surface upload failures"
)]
fn scenario_surface_upload_failures(ftp_context: FtpContext) {
    let _ = ftp_context;
}

#[scenario(
    path = "tests/features/ftp_sync.feature",
    name = "Simulate a sync without network access"
)]
fn scenario_simulate(ftp_context: FtpContext) {
    let _ = ftp_context;
}
