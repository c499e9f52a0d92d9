//! UI-facing control layer for entrain
//!
//! One [`BeatController`] per mounted UI surface: it owns exactly one
//! audio engine, serializes racy play requests against the engine's
//! asynchronous start, and exposes the playback state the UI renders.

mod controller;

pub use controller::{BeatController, ControlEvent};
