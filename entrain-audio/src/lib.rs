//! Binaural beat audio engine for entrain
//!
//! This crate provides the core playback pipeline:
//! - Track: catalog of named frequency pairs
//! - BeatGraph: oscillator pair, channel gains, stereo merge, master gain
//! - Backend: the platform seam (cpal output stream, mock for tests)
//! - BinauralEngine: race-safe graph lifecycle (start/stop/mute/destroy)

mod backend;
mod engine;
mod graph;
mod track;

pub use backend::{
    BackendError, ContextState, CpalBackend, CpalContext, OutputBackend, OutputContext,
    RenderSlot,
};
#[cfg(any(test, feature = "mock"))]
pub use backend::{MockBackend, MockContext};
pub use engine::{BinauralEngine, EngineError};
pub use graph::{BeatGraph, GraphError, CHANNEL_GAIN, MASTER_GAIN};
pub use track::{find_track, Track, TRACKS};
