//! # pcm-capture-core
//!
//! Platform-agnostic core of the PCM capture/transcode pipeline.
//!
//! A native backend (Windows Media Foundation) implements `DeviceEnumerator`,
//! `MediaSourceOpener` and `MediaReader`; everything else lives here: the
//! capture pump and recording session state machine, the streaming WAV
//! container writer, and sample conversion for visualization.
//!
//! ## Architecture
//!
//! ```text
//! pcm-capture-core (this crate)
//! ├── traits/       ← DeviceEnumerator, MediaSourceOpener, MediaReader
//! ├── models/       ← CaptureError, CaptureState, FormatDescriptor, AudioDevice, AudioSample, etc.
//! ├── processing/   ← sample conversion, WAV chunk layout, waveform summary
//! ├── session/      ← CapturePump, RecordingSession, DeviceRecorder
//! └── storage/      ← WavContainerWriter, metadata sidecars
//! ```
//!
//! ## Data flow
//!
//! ```text
//! DeviceEnumerator → MediaSourceOpener → CapturePump ─┬→ WavContainerWriter → finalized .wav
//!                                                      └→ SampleCallback → sample_converter::to_float
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioDevice, AudioSample, DeviceAttribute, FrameEvent};
pub use models::config::CaptureConfiguration;
pub use models::error::CaptureError;
pub use models::format::FormatDescriptor;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::CaptureState;
pub use processing::sample_converter::to_float;
pub use session::device_recorder::DeviceRecorder;
pub use session::pump::{CapturePump, SampleCallback};
pub use session::recording::RecordingSession;
pub use storage::wav_writer::WavContainerWriter;
pub use traits::media_source::{
    DeviceEnumerator, FrameHandler, MediaReader, MediaSource, MediaSourceOpener, NegotiatedSource,
};
