//! Playback controller - binds UI actions to the binaural engine

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crossbeam_channel::{bounded, Receiver, Sender};

use entrain_audio::{find_track, BinauralEngine, OutputBackend};

/// Events surfaced to the UI.
///
/// Delivery is best effort: the channel never blocks the control path and
/// drops events once full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    Started { track: &'static str },
    Stopped,
    Error(String),
}

/// Event channel capacity; headroom for bursts without saturation.
const EVENT_BUFFER: usize = 64;

/// Single entry point for UI code.
///
/// Owns exactly one lazily created [`BinauralEngine`] for its lifetime.
/// `play` can overlap with itself on the event loop; the pending marker
/// decides which call is allowed to commit observable state, mirroring
/// the engine's own start token one level up.
pub struct BeatController<B: OutputBackend> {
    backend: RefCell<Option<B>>,
    engine: RefCell<Option<Rc<BinauralEngine<B>>>>,
    /// Track name the most recent play call is still waiting on.
    pending: Cell<Option<&'static str>>,
    current: Cell<Option<&'static str>>,
    playing: Cell<bool>,
    muted: Cell<bool>,
    closed: Cell<bool>,
    events: Sender<ControlEvent>,
}

impl<B: OutputBackend> BeatController<B> {
    /// Create a controller and the receiving end of its event channel.
    pub fn new(backend: B) -> (Self, Receiver<ControlEvent>) {
        let (events, receiver) = bounded(EVENT_BUFFER);
        let controller = Self {
            backend: RefCell::new(Some(backend)),
            engine: RefCell::new(None),
            pending: Cell::new(None),
            current: Cell::new(None),
            playing: Cell::new(false),
            muted: Cell::new(false),
            closed: Cell::new(false),
            events,
        };
        (controller, receiver)
    }

    /// Name of the track the UI should show as playing, if any.
    pub fn current_track(&self) -> Option<&'static str> {
        self.current.get()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.get()
    }

    pub fn is_muted(&self) -> bool {
        self.muted.get()
    }

    /// Look up `name` in the catalog and start it.
    ///
    /// Unknown names are reported on the event channel and change
    /// nothing. When several plays overlap, only the most recent one
    /// commits state; the others find the pending marker moved on and
    /// leave the winner's state alone.
    pub async fn play(&self, name: &str) {
        let Some(track) = find_track(name) else {
            tracing::error!("track {name:?} does not exist");
            self.emit(ControlEvent::Error(format!("track {name:?} does not exist")));
            return;
        };

        let Some(engine) = self.ensure_engine() else {
            self.pending.set(None);
            self.emit(ControlEvent::Error("audio engine is unavailable".into()));
            return;
        };

        self.pending.set(Some(track.name));

        match engine.start(track).await {
            Ok(true) => {
                if self.pending.get() == Some(track.name) {
                    self.pending.set(None);
                    self.current.set(Some(track.name));
                    self.playing.set(true);
                    self.emit(ControlEvent::Started { track: track.name });
                } else if self.pending.get().is_none() {
                    // A pause landed while we were starting; undo our graph.
                    engine.stop();
                }
                // Otherwise a newer play owns the state now; not ours to touch.
            }
            Ok(false) => {
                // Lost the race to a newer start or a stop. Expected; silent.
                self.release_if_owner(track.name);
            }
            Err(err) => {
                tracing::error!("unable to start {:?}: {err}", track.name);
                self.emit(ControlEvent::Error(format!(
                    "unable to start {:?}: {err}",
                    track.name
                )));
                self.release_if_owner(track.name);
            }
        }
    }

    /// Stop playback. Idempotent; also cancels any play still in flight.
    pub fn pause(&self) {
        if let Some(engine) = self.engine.borrow().as_ref() {
            if engine.is_playing() {
                engine.stop();
            }
        }
        self.pending.set(None);
        if self.playing.replace(false) {
            self.emit(ControlEvent::Stopped);
        }
        self.current.set(None);
    }

    /// Pause when `name` is already playing, otherwise play it.
    pub async fn toggle(&self, name: &str) {
        if self.playing.get() && self.current.get() == find_track(name).map(|t| t.name) {
            self.pause();
            return;
        }
        self.play(name).await;
    }

    /// Mute or unmute without stopping playback. Remembered for engines
    /// created later.
    pub fn set_muted(&self, muted: bool) {
        self.muted.set(muted);
        if let Some(engine) = self.engine.borrow().as_ref() {
            engine.set_muted(muted);
        }
    }

    /// Tear the controller down; call exactly once when the owning
    /// surface goes away.
    ///
    /// Destroys the engine (at most once) and clears every reference, so
    /// a play still in flight finds itself superseded and cannot touch
    /// state here afterwards. Later calls are safe no-ops; later plays
    /// report an error event.
    pub async fn shutdown(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.pending.set(None);
        self.current.set(None);
        self.playing.set(false);
        let engine = self.engine.borrow_mut().take();
        if let Some(engine) = engine {
            engine.destroy().await;
        }
    }

    fn ensure_engine(&self) -> Option<Rc<BinauralEngine<B>>> {
        if self.closed.get() {
            return None;
        }
        let mut engine = self.engine.borrow_mut();
        if let Some(engine) = engine.as_ref() {
            return Some(Rc::clone(engine));
        }
        let backend = self.backend.borrow_mut().take()?;
        let fresh = Rc::new(BinauralEngine::new(backend));
        if self.muted.get() {
            fresh.set_muted(true);
        }
        *engine = Some(Rc::clone(&fresh));
        Some(fresh)
    }

    fn release_if_owner(&self, name: &'static str) {
        if self.pending.get() == Some(name) {
            self.pending.set(None);
            self.current.set(None);
            self.playing.set(false);
        }
    }

    fn emit(&self, event: ControlEvent) {
        let _ = self.events.try_send(event);
    }
}
