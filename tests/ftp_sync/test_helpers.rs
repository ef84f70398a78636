//! Shared fixtures and helpers for FTP sync BDD scenarios.

use std::cell::RefCell;
use std::rc::Rc;

use backup_sync::test_support::{FakeTransport, RecordingSink};
use backup_sync::{RawOptions, SyncError};
use rstest::fixture;

#[derive(Debug)]
pub enum SyncOutcome {
    Synced(Result<(), SyncError>),
    Simulated,
}

#[derive(Clone, Debug, Default)]
pub struct FtpContext {
    pub options: Rc<RefCell<RawOptions>>,
    pub transport: Rc<RefCell<FakeTransport>>,
    pub sink: RecordingSink,
    pub outcome: Rc<RefCell<Option<SyncOutcome>>>,
}

impl FtpContext {
    pub fn update_options(&self, update: impl FnOnce(RawOptions) -> RawOptions) {
        let current = self.options.take();
        *self.options.borrow_mut() = update(current);
    }

    pub fn update_transport(&self, update: impl FnOnce(FakeTransport) -> FakeTransport) {
        let current = self.transport.take();
        *self.transport.borrow_mut() = update(current);
    }

    pub fn transport(&self) -> FakeTransport {
        self.transport.borrow().clone()
    }
}

#[fixture]
pub fn ftp_context() -> FtpContext {
    FtpContext::default()
}
