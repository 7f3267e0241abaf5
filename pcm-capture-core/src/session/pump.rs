use std::path::PathBuf;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::models::audio_models::{AudioSample, FrameEvent};
use crate::models::error::CaptureError;
use crate::models::format::FormatDescriptor;
use crate::models::state::CaptureState;
use crate::storage::wav_writer::{FinalizedContainer, WavContainerWriter};
use crate::traits::media_source::MediaReader;

/// Consumer callback for published samples.
///
/// Invoked on the delivering thread with the session lock released, so it
/// may call back into the session (e.g. `stop`). Marshal to a UI thread if
/// needed.
pub type SampleCallback = Arc<dyn Fn(&AudioSample) + Send + Sync + 'static>;

/// Mutable session state. Only touched while holding `CapturePump::state`.
pub(crate) struct PumpState {
    pub(crate) state: CaptureState,
    pub(crate) active: bool,
    pub(crate) measure_only: bool,
    pub(crate) bytes_recorded: u64,
    pub(crate) frames_delivered: u64,
    /// Bumped by every `start`; a re-arm only goes out for the run it belongs to.
    pub(crate) generation: u64,
    pub(crate) writer: Option<WavContainerWriter>,
    pub(crate) output_path: Option<PathBuf>,
    pub(crate) callback: Option<SampleCallback>,
}

impl PumpState {
    fn new() -> Self {
        Self {
            state: CaptureState::Negotiated,
            active: false,
            measure_only: false,
            bytes_recorded: 0,
            frames_delivered: 0,
            generation: 0,
            writer: None,
            output_path: None,
            callback: None,
        }
    }

    /// Deactivate and finalize the container. Streaming → Stopped.
    ///
    /// On a finalize error the file is closed with whatever sizes it had and
    /// the state becomes `Failed`.
    pub(crate) fn stop(&mut self) -> Result<Option<FinalizedContainer>, CaptureError> {
        self.active = false;
        if self.state.is_streaming() {
            self.state = CaptureState::Stopped;
        }
        let Some(mut writer) = self.writer.take() else {
            return Ok(None);
        };
        writer.finalize().inspect_err(|e| {
            self.state = CaptureState::Failed(e.clone());
        })
    }

    /// Deactivate after a read or write failure, closing the container best-effort.
    pub(crate) fn fail(&mut self, error: CaptureError) {
        log::error!("capture failed: {}", error);
        self.active = false;
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                log::warn!("failed to finalize container after error: {}", e);
            }
        }
        self.state = CaptureState::Failed(error);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active && self.generation == generation
    }

    /// Apply one delivery. Returns the sample to publish and whether to re-arm.
    fn apply(&mut self, event: FrameEvent) -> (AudioSample, bool) {
        match event {
            FrameEvent::Failed(message) => {
                let error = CaptureError::Read(message);
                let sample = AudioSample::error(error.to_string());
                self.fail(error);
                (sample, false)
            }
            FrameEvent::Sample {
                data: None,
                end_of_stream,
            } => (AudioSample::tick(end_of_stream), !end_of_stream),
            FrameEvent::Sample {
                data: Some(bytes),
                end_of_stream,
            } => {
                if let Some(writer) = self.writer.as_mut() {
                    if let Err(e) = writer.append_data(&bytes) {
                        let sample = AudioSample::error(e.to_string());
                        self.fail(e);
                        return (sample, false);
                    }
                }
                self.bytes_recorded += bytes.len() as u64;
                self.frames_delivered += 1;
                (AudioSample::with_data(bytes, end_of_stream), !end_of_stream)
            }
        }
    }
}

/// The asynchronous read loop.
///
/// One `request_frame` on the reader yields one `handle_frame`; the pump
/// publishes the sample and issues the next request until the stream ends,
/// fails, or the session is stopped.
///
/// ```text
/// arm() ──► reader.request_frame() ··· native thread ···► handle_frame(event)
///   ▲                                                        │ lock: check active,
///   │                                                        │ append, count
///   └──────────── unless end-of-stream / inactive ◄──────────┘ publish sample
/// ```
pub struct CapturePump<R: MediaReader + 'static> {
    format: FormatDescriptor,
    // Separate from `state`: the native request is never issued under the session lock.
    // Held across request and flush so a stale request cannot slip past a restart.
    reader: Mutex<Option<Arc<R>>>,
    pub(crate) state: Mutex<PumpState>,
}

impl<R: MediaReader + 'static> CapturePump<R> {
    /// Wrap a negotiated reader and bind its frame handler to this pump.
    pub(crate) fn new(reader: R, format: FormatDescriptor) -> Arc<Self> {
        let reader = Arc::new(reader);
        let pump = Arc::new(Self {
            format,
            reader: Mutex::new(Some(Arc::clone(&reader))),
            state: Mutex::new(PumpState::new()),
        });

        let weak: Weak<Self> = Arc::downgrade(&pump);
        reader.set_frame_handler(Arc::new(move |event| match weak.upgrade() {
            Some(pump) => pump.handle_frame(event),
            None => log::debug!("frame delivered after session was released"),
        }));
        pump
    }

    pub fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    /// Process one delivery from the reader.
    ///
    /// The state change is applied atomically under the session lock or not
    /// at all (inactive session). Publishing and re-arming happen after the
    /// lock is released, and the re-arm is dropped if the callback (or another
    /// thread) stopped or restarted the session in between.
    pub fn handle_frame(&self, event: FrameEvent) {
        let (sample, rearm, generation, callback) = {
            let mut state = self.state.lock();
            if !state.active {
                log::debug!("discarding frame delivered while inactive");
                return;
            }
            let callback = state.callback.clone();
            let generation = state.generation;
            let (sample, rearm) = state.apply(event);
            (sample, rearm, generation, callback)
        };

        if let Some(ref callback) = callback {
            callback(&sample);
        }

        if rearm {
            if let Err(e) = self.arm(generation) {
                if let Some(ref callback) = callback {
                    callback(&AudioSample::error(e.to_string()));
                }
            }
        }
    }

    /// Issue the next frame request if run `generation` is still active.
    ///
    /// Returns `Ok(false)` when inactive or superseded. A failed request moves
    /// the session to `Failed` and is returned as the error.
    pub(crate) fn arm(&self, generation: u64) -> Result<bool, CaptureError> {
        let requested = {
            let reader = self.reader.lock();
            if !self.state.lock().is_current(generation) {
                return Ok(false);
            }
            match reader.as_ref() {
                Some(reader) => reader.request_frame(),
                None => Err(CaptureError::Disposed),
            }
        };

        match requested {
            Ok(()) => Ok(true),
            Err(e) => {
                let mut state = self.state.lock();
                if !state.is_current(generation) {
                    // Stopped while the request was being issued.
                    return Ok(false);
                }
                let error = match e {
                    CaptureError::Read(_) | CaptureError::Disposed => e,
                    other => CaptureError::Read(other.to_string()),
                };
                state.fail(error.clone());
                Err(error)
            }
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Discard buffered frames and any request still pending on the reader.
    pub(crate) fn flush_reader(&self) -> Result<(), CaptureError> {
        match self.reader.lock().as_ref() {
            Some(reader) => reader.flush(),
            None => Err(CaptureError::Disposed),
        }
    }

    pub(crate) fn release_reader(&self) -> Option<Arc<R>> {
        self.reader.lock().take()
    }
}
