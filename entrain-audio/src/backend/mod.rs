//! Output backends - the platform seam between the engine and audio hardware

mod device;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use device::{CpalBackend, CpalContext};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBackend, MockContext};

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::graph::BeatGraph;

/// Shared slot the output callback renders from. `None` means silence.
///
/// The engine installs and removes graphs on the control thread; the
/// callback only ever takes the lock opportunistically.
pub type RenderSlot = Arc<Mutex<Option<BeatGraph>>>;

/// Errors raised by an output backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("no audio output device available")]
    NoOutputDevice,
    #[error("failed to query output config: {0}")]
    Config(String),
    #[error("failed to open output stream: {0}")]
    Stream(String),
    #[error("failed to resume output: {0}")]
    Resume(String),
    #[error("failed to close output: {0}")]
    Close(String),
}

/// Lifecycle state of an output context.
///
/// Contexts open `Suspended` (no audio delivered yet), move to `Running`
/// on resume, and end `Closed`. A closed context never runs again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// Factory for output contexts.
#[allow(async_fn_in_trait)]
pub trait OutputBackend {
    type Context: OutputContext;

    /// Acquire the output device and open a suspended stream that renders
    /// from `slot`.
    fn open(&self, slot: RenderSlot) -> Result<Self::Context, BackendError>;
}

/// An open output context.
///
/// Methods take `&self`: the engine keeps hold of the context across its
/// one suspension point, and all mutation happens on the control thread.
#[allow(async_fn_in_trait)]
pub trait OutputContext {
    fn state(&self) -> ContextState;

    fn sample_rate(&self) -> u32;

    /// Start audio delivery. This is the engine's one true suspension
    /// point; resuming a closed context fails.
    async fn resume(&self) -> Result<(), BackendError>;

    /// Tear the stream down. The context is unusable afterwards.
    async fn close(&self) -> Result<(), BackendError>;
}
