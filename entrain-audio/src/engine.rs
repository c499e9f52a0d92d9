//! Binaural beat engine - race-safe audio graph lifecycle
//!
//! `start` is asynchronous because resuming the output context can take a
//! whole turn of the event loop, so several starts may be in flight at
//! once. Each call mints a start token; after the resume it checks the
//! token is still current and abandons cleanly when a newer call (or a
//! stop) has taken over. Only the most recent call's graph ever survives.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::backend::{BackendError, ContextState, OutputBackend, OutputContext, RenderSlot};
use crate::graph::{BeatGraph, GraphError, MASTER_GAIN};
use crate::track::Track;

/// Errors surfaced by [`BinauralEngine::start`].
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed track data reached the engine; a caller bug, not a user
    /// fault.
    #[error("invalid track: {0}")]
    InvalidTrack(&'static str),
    /// The platform has no usable audio output.
    #[error("audio output is unavailable: {0}")]
    Unsupported(#[source] BackendError),
    /// The output context failed to resume mid-start.
    #[error("audio output failed: {0}")]
    Output(#[source] BackendError),
    /// Graph construction failed after the race checks passed. The engine
    /// stays usable for a retry.
    #[error("could not build beat graph: {0}")]
    Graph(#[from] GraphError),
}

/// Two-oscillator binaural beat engine.
///
/// One engine owns at most one output context for its whole life (until
/// [`destroy`](Self::destroy)) and at most one live oscillator pair. The
/// context is opened lazily on the first `start`; the graph is rebuilt on
/// every `start` and dropped on `stop`.
pub struct BinauralEngine<B: OutputBackend> {
    backend: B,
    context: RefCell<Option<Rc<B::Context>>>,
    render: RenderSlot,
    /// Token of the start call currently allowed to install a graph.
    /// `None` means any start still in flight has been cancelled.
    token: Cell<Option<u64>>,
    next_token: Cell<u64>,
    muted: Cell<bool>,
}

impl<B: OutputBackend> BinauralEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            context: RefCell::new(None),
            render: Arc::new(Mutex::new(None)),
            token: Cell::new(None),
            next_token: Cell::new(0),
            muted: Cell::new(false),
        }
    }

    /// Start playing `track`, replacing whatever was playing before.
    ///
    /// Returns `Ok(false)` when this call was superseded by a newer start
    /// (or a stop) while the context was resuming. Losing that race is
    /// normal behavior, not an error.
    pub async fn start(&self, track: &Track) -> Result<bool, EngineError> {
        track.validate().map_err(EngineError::InvalidTrack)?;

        let context = self.ensure_context()?;
        let token = self.mint_token();

        if context.state() == ContextState::Suspended {
            if let Err(err) = context.resume().await {
                // A superseded call's resume failure is just a lost race.
                if !self.owns_token(token) {
                    return Ok(false);
                }
                self.token.set(None);
                return Err(EngineError::Output(err));
            }
        }

        // Control was yielded during the resume; a newer start, a stop or
        // a destroy may have taken over in the meantime.
        if !self.owns_token(token) {
            return Ok(false);
        }

        // Replace a previous pair, keeping our claim on the token.
        self.stop_internal(true);

        let graph = match BeatGraph::new(track, context.sample_rate(), self.muted.get()) {
            Ok(graph) => graph,
            Err(err) => {
                // Nothing was installed and the failed nodes are already
                // released; just give up our claim.
                if self.owns_token(token) {
                    self.token.set(None);
                }
                return Err(err.into());
            }
        };
        *self.render.lock() = Some(graph);
        Ok(true)
    }

    /// Stop playback and release the oscillator pair. Idempotent; also a
    /// hard cancellation point for any start still in flight.
    pub fn stop(&self) {
        self.stop_internal(false);
    }

    /// True iff the oscillator pair is installed.
    pub fn is_playing(&self) -> bool {
        self.render.lock().is_some()
    }

    /// Frequencies of the live pair, `(left, right)`, if any.
    pub fn playing_frequencies(&self) -> Option<(f32, f32)> {
        self.render.lock().as_ref().map(|graph| graph.frequencies())
    }

    /// Switch the master gain between silent and the base level without
    /// touching the oscillators. Safe to call with no graph installed.
    pub fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
        if let Some(graph) = self.render.lock().as_mut() {
            graph.set_master_gain(if muted { 0.0 } else { MASTER_GAIN });
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.get()
    }

    /// Stop playback and close the output context.
    ///
    /// Close failures are logged, not returned: the feature is shutting
    /// down and the caller can take no corrective action. Safe to call
    /// more than once; a later `start` opens a fresh context.
    pub async fn destroy(&self) {
        self.stop_internal(false);
        let context = self.context.borrow_mut().take();
        if let Some(context) = context {
            if let Err(err) = context.close().await {
                tracing::warn!("failed to close audio output: {err}");
            }
        }
    }

    fn ensure_context(&self) -> Result<Rc<B::Context>, EngineError> {
        let mut current = self.context.borrow_mut();
        if let Some(context) = current.as_ref() {
            return Ok(Rc::clone(context));
        }
        let context = self
            .backend
            .open(Arc::clone(&self.render))
            .map(Rc::new)
            .map_err(EngineError::Unsupported)?;
        *current = Some(Rc::clone(&context));
        Ok(context)
    }

    fn mint_token(&self) -> u64 {
        let token = self.next_token.get().wrapping_add(1);
        self.next_token.set(token);
        self.token.set(Some(token));
        token
    }

    fn owns_token(&self, token: u64) -> bool {
        self.token.get() == Some(token)
    }

    fn stop_internal(&self, preserve_token: bool) {
        // Dropping the graph releases both oscillators, both channel gains
        // and the merge stage together; there is no partially-torn-down
        // state to tolerate.
        self.render.lock().take();
        if !preserve_token {
            self.token.set(None);
        }
    }
}
