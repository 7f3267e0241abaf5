use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::audio_models::FrameEvent;
use crate::models::error::CaptureError;
use crate::models::format::FormatDescriptor;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::processing::sample_converter;
use crate::storage::wav_writer::{self, WavContainerWriter};
use crate::traits::media_source::{MediaReader, MediaSource, MediaSourceOpener, NegotiatedSource};

use super::pump::{CapturePump, SampleCallback};

enum OutputTarget<'a> {
    Container(&'a Path),
    /// Decode and publish frames without writing anything.
    MeasureOnly(Option<&'a Path>),
}

/// A negotiated source streaming into a WAV container.
///
/// Owns the reader exclusively. Reusable: `start` may be called again after
/// `stop` or a failure and fully resets the byte counter and output file.
/// Dropping the session disposes it.
pub struct RecordingSession<R: MediaReader + 'static> {
    pump: Arc<CapturePump<R>>,
    disposed: AtomicBool,
}

impl<R: MediaReader + 'static> RecordingSession<R> {
    /// Open and negotiate `source`. Idle → Negotiated.
    pub fn open<O>(opener: &O, source: &MediaSource) -> Result<Self, CaptureError>
    where
        O: MediaSourceOpener<Reader = R>,
    {
        let negotiated = opener.open(source)?;
        log::info!(
            "negotiated {} ch, {} Hz, {}-bit PCM for {:?}",
            negotiated.format.channels(),
            negotiated.format.sample_rate(),
            negotiated.format.bits_per_sample(),
            source
        );
        Ok(Self::from_negotiated(negotiated))
    }

    pub fn from_negotiated(negotiated: NegotiatedSource<R>) -> Self {
        Self {
            pump: CapturePump::new(negotiated.reader, negotiated.format),
            disposed: AtomicBool::new(false),
        }
    }

    /// Decode the file at `source` into `destination`.
    ///
    /// When `destination` is the source itself the pass is measure-only:
    /// frames are decoded and published but nothing is written.
    pub fn transcode<O>(
        opener: &O,
        source: &Path,
        destination: &Path,
        callback: SampleCallback,
    ) -> Result<Self, CaptureError>
    where
        O: MediaSourceOpener<Reader = R>,
    {
        let session = Self::open(opener, &MediaSource::File(source.to_path_buf()))?;
        let target = if same_file(source, destination) {
            OutputTarget::MeasureOnly(Some(source))
        } else {
            OutputTarget::Container(destination)
        };
        session.begin(target, callback)?;
        Ok(session)
    }

    /// Start streaming into a new container at `output_path`.
    ///
    /// Finalizes any previously open container first. Returns once the
    /// first frame request has been issued.
    pub fn start(&self, output_path: impl AsRef<Path>, callback: SampleCallback) -> Result<(), CaptureError> {
        self.begin(OutputTarget::Container(output_path.as_ref()), callback)
    }

    /// Start streaming without writing a container.
    pub fn start_measurement(&self, callback: SampleCallback) -> Result<(), CaptureError> {
        self.begin(OutputTarget::MeasureOnly(None), callback)
    }

    fn begin(&self, target: OutputTarget<'_>, callback: SampleCallback) -> Result<(), CaptureError> {
        self.ensure_live()?;

        // Retire the previous run before flushing so none of its frames re-arm.
        {
            let mut state = self.pump.state.lock();
            state.generation += 1;
            if let Err(e) = state.stop() {
                log::warn!("failed to finalize previous recording: {}", e);
            }
        }
        self.pump.flush_reader()?;

        let generation = {
            let mut state = self.pump.state.lock();
            state.bytes_recorded = 0;
            state.frames_delivered = 0;
            state.callback = Some(callback);

            match target {
                OutputTarget::Container(path) => {
                    let mut writer = WavContainerWriter::new();
                    writer
                        .open(path)
                        .and_then(|()| writer.write_provisional_header(self.pump.format()))?;
                    state.writer = Some(writer);
                    state.measure_only = false;
                    state.output_path = Some(path.to_path_buf());
                }
                OutputTarget::MeasureOnly(path) => {
                    state.measure_only = true;
                    state.output_path = path.map(Path::to_path_buf);
                }
            }

            state.active = true;
            state.state = CaptureState::Streaming;
            log::info!(
                "streaming {}",
                state
                    .output_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(measure only)".into())
            );
            state.generation
        };

        self.pump.arm(generation).map(|_| ())
    }

    /// Explicitly issue one frame request. No-op when inactive.
    pub fn read_next(&self) -> Result<(), CaptureError> {
        self.ensure_live()?;
        self.pump.arm(self.pump.generation()).map(|_| ())
    }

    /// Feed one delivery into the pump, as the reader's handler does.
    pub fn handle_frame(&self, event: FrameEvent) {
        self.pump.handle_frame(event);
    }

    /// Stop streaming and finalize the container.
    ///
    /// Safe from any state and idempotent: returns `Ok(None)` when no
    /// container was open. A finalize failure is returned and leaves the
    /// file with possibly stale size fields.
    pub fn stop(&self) -> Result<Option<RecordingResult>, CaptureError> {
        let finalized = self.pump.state.lock().stop()?;
        let Some(container) = finalized else {
            return Ok(None);
        };

        let checksum = wav_writer::sha256_file(&container.file_path)?;
        let format = self.pump.format().clone();
        Ok(Some(RecordingResult {
            duration_secs: format.duration_secs(container.data_bytes),
            file_path: container.file_path,
            data_bytes: container.data_bytes,
            format,
            checksum,
        }))
    }

    /// Stop best-effort and release the reader. Runs once; later calls do nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut state = self.pump.state.lock();
            if let Err(e) = state.stop() {
                log::warn!("failed to finalize recording on dispose: {}", e);
            }
            state.callback = None;
        }
        drop(self.pump.release_reader());
        log::debug!("recording session disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Convert delivered bytes using the negotiated bit depth.
    pub fn convert(&self, data: &[u8]) -> Result<Vec<f32>, CaptureError> {
        sample_converter::to_float(data, self.pump.format().bits_per_sample())
    }

    pub fn format(&self) -> &FormatDescriptor {
        self.pump.format()
    }

    pub fn channels(&self) -> u16 {
        self.pump.format().channels()
    }

    pub fn sample_rate(&self) -> u32 {
        self.pump.format().sample_rate()
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.pump.format().bits_per_sample()
    }

    pub fn state(&self) -> CaptureState {
        self.pump.state.lock().state.clone()
    }

    pub fn is_active(&self) -> bool {
        self.pump.state.lock().active
    }

    /// True for a transcode pass that only decodes its own source.
    pub fn is_measure_only(&self) -> bool {
        self.pump.state.lock().measure_only
    }

    /// PCM bytes received since the last `start`.
    pub fn bytes_recorded(&self) -> u64 {
        self.pump.state.lock().bytes_recorded
    }

    /// Data-carrying frames received since the last `start`.
    pub fn frames_delivered(&self) -> u64 {
        self.pump.state.lock().frames_delivered
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.pump.state.lock().output_path.clone()
    }

    fn ensure_live(&self) -> Result<(), CaptureError> {
        if self.is_disposed() {
            Err(CaptureError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl<R: MediaReader + 'static> Drop for RecordingSession<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
