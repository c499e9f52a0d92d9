//! Deterministic in-process backend for tests and headless runs

use std::cell::Cell;
use std::rc::Rc;

use super::{BackendError, ContextState, OutputBackend, OutputContext, RenderSlot};

/// Counters and failure switches shared between a backend and its contexts.
#[derive(Debug, Default)]
struct MockShared {
    opened: Cell<u32>,
    closed: Cell<u32>,
    fail_open: Cell<bool>,
    fail_resume: Cell<bool>,
    fail_close: Cell<bool>,
}

/// Backend that opens contexts without touching any hardware.
///
/// Clones share their counters and switches, so a test can keep a handle
/// after moving the backend into an engine.
#[derive(Debug, Clone)]
pub struct MockBackend {
    shared: Rc<MockShared>,
    sample_rate: u32,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_sample_rate(48_000)
    }

    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self { shared: Rc::default(), sample_rate }
    }

    /// Make `open` report the platform as unsupported.
    pub fn fail_open(&self, fail: bool) {
        self.shared.fail_open.set(fail);
    }

    pub fn fail_resume(&self, fail: bool) {
        self.shared.fail_resume.set(fail);
    }

    pub fn fail_close(&self, fail: bool) {
        self.shared.fail_close.set(fail);
    }

    pub fn contexts_opened(&self) -> u32 {
        self.shared.opened.get()
    }

    pub fn contexts_closed(&self) -> u32 {
        self.shared.closed.get()
    }
}

pub struct MockContext {
    state: Cell<ContextState>,
    sample_rate: u32,
    shared: Rc<MockShared>,
    // The slot is held so the mock matches the real backend's ownership
    // shape; nothing renders from it.
    _slot: RenderSlot,
}

impl OutputBackend for MockBackend {
    type Context = MockContext;

    fn open(&self, slot: RenderSlot) -> Result<MockContext, BackendError> {
        if self.shared.fail_open.get() {
            return Err(BackendError::NoOutputDevice);
        }
        self.shared.opened.set(self.shared.opened.get() + 1);
        Ok(MockContext {
            state: Cell::new(ContextState::Suspended),
            sample_rate: self.sample_rate,
            shared: Rc::clone(&self.shared),
            _slot: slot,
        })
    }
}

impl OutputContext for MockContext {
    fn state(&self) -> ContextState {
        self.state.get()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn resume(&self) -> Result<(), BackendError> {
        // A real resume completes on a later turn of the event loop;
        // yielding once makes overlapping starts interleave the same way.
        tokio::task::yield_now().await;
        if self.state.get() == ContextState::Closed {
            return Err(BackendError::Resume("context is closed".into()));
        }
        if self.shared.fail_resume.get() {
            return Err(BackendError::Resume("simulated resume failure".into()));
        }
        self.state.set(ContextState::Running);
        Ok(())
    }

    async fn close(&self) -> Result<(), BackendError> {
        self.state.set(ContextState::Closed);
        self.shared.closed.set(self.shared.closed.get() + 1);
        if self.shared.fail_close.get() {
            return Err(BackendError::Close("simulated close failure".into()));
        }
        Ok(())
    }
}
