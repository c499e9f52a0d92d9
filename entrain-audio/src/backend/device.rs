//! cpal-backed output on the system default host

use std::cell::{Cell, RefCell};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::{BackendError, ContextState, OutputBackend, OutputContext, RenderSlot};

/// Output backend on the system default audio host.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

/// One open cpal output stream plus its lifecycle state.
///
/// `cpal::Stream` is not `Send`; the context lives on the control thread
/// and only the render closure runs on the audio thread.
pub struct CpalContext {
    stream: RefCell<Option<cpal::Stream>>,
    state: Cell<ContextState>,
    sample_rate: u32,
}

impl OutputBackend for CpalBackend {
    type Context = CpalContext;

    fn open(&self, slot: RenderSlot) -> Result<CpalContext, BackendError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(BackendError::NoOutputDevice)?;
        let config = device
            .default_output_config()
            .map_err(|e| BackendError::Config(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // Never block the audio thread; under contention emit
                    // silence for one buffer instead.
                    if let Some(mut guard) = slot.try_lock() {
                        if let Some(graph) = guard.as_mut() {
                            graph.render(data, channels);
                            return;
                        }
                    }
                    data.fill(0.0);
                },
                |err| tracing::error!("output stream error: {err}"),
                None,
            )
            .map_err(|e| BackendError::Stream(e.to_string()))?;

        // Open suspended; hosts that cannot pause run from the start.
        let state = match stream.pause() {
            Ok(()) => ContextState::Suspended,
            Err(err) => {
                tracing::debug!("output stream does not pause ({err}), opening running");
                ContextState::Running
            }
        };

        Ok(CpalContext {
            stream: RefCell::new(Some(stream)),
            state: Cell::new(state),
            sample_rate,
        })
    }
}

impl OutputContext for CpalContext {
    fn state(&self) -> ContextState {
        self.state.get()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn resume(&self) -> Result<(), BackendError> {
        match self.state.get() {
            ContextState::Running => Ok(()),
            ContextState::Closed => Err(BackendError::Resume("context is closed".into())),
            ContextState::Suspended => {
                match self.stream.borrow().as_ref() {
                    Some(stream) => stream
                        .play()
                        .map_err(|e| BackendError::Resume(e.to_string()))?,
                    None => return Err(BackendError::Resume("stream already released".into())),
                }
                self.state.set(ContextState::Running);
                Ok(())
            }
        }
    }

    async fn close(&self) -> Result<(), BackendError> {
        // Dropping the stream stops the callback and releases the device.
        self.stream.borrow_mut().take();
        self.state.set(ContextState::Closed);
        Ok(())
    }
}
