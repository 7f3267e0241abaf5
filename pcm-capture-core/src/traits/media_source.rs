use std::path::PathBuf;
use std::sync::Arc;

use crate::models::audio_models::{AudioDevice, FrameEvent};
use crate::models::error::CaptureError;
use crate::models::format::FormatDescriptor;

/// Receives the result of every frame request issued on a `MediaReader`.
///
/// Invoked on a subsystem-owned thread, one delivery at a time per reader.
pub type FrameHandler = Arc<dyn Fn(FrameEvent) + Send + Sync + 'static>;

/// Lists capture-capable devices.
pub trait DeviceEnumerator {
    /// All audio capture devices currently present. Zero devices is `Ok(vec![])`.
    fn list_devices(&self) -> Result<Vec<AudioDevice>, CaptureError>;
}

/// Pull-style, asynchronous reader over a negotiated audio stream.
///
/// Each `request_frame` yields exactly one delivery to the bound
/// `FrameHandler`: data, a tick without data, end-of-stream, or a failure.
pub trait MediaReader: Send + Sync {
    /// Bind the handler that receives deliveries. Replaces any previous one.
    fn set_frame_handler(&self, handler: FrameHandler);

    /// Issue one asynchronous frame request. Must not block on, or deliver
    /// from, the calling thread.
    fn request_frame(&self) -> Result<(), CaptureError>;

    /// Discard frames buffered by the subsystem.
    fn flush(&self) -> Result<(), CaptureError>;
}

/// Where a reader gets its audio from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Device(AudioDevice),
    File(PathBuf),
}

/// A reader whose output has been negotiated to uncompressed PCM.
pub struct NegotiatedSource<R> {
    pub reader: R,
    pub format: FormatDescriptor,
}

/// Opens a native media source and negotiates PCM output.
///
/// Implementations release any partially created reader before returning
/// an error.
pub trait MediaSourceOpener {
    type Reader: MediaReader + 'static;

    /// Fails with `SourceOpen` if the source cannot be activated or opened,
    /// `FormatNegotiation` if it cannot be decoded to PCM.
    fn open(&self, source: &MediaSource) -> Result<NegotiatedSource<Self::Reader>, CaptureError>;
}
