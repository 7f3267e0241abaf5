//! In-process reader and opener that deliver frames on command.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioDevice, FrameEvent};
use crate::models::error::CaptureError;
use crate::models::format::FormatDescriptor;
use crate::traits::media_source::{
    DeviceEnumerator, FrameHandler, MediaReader, MediaSource, MediaSourceOpener, NegotiatedSource,
};

/// Observes and drives a `FakeReader` after it has been moved into a session.
#[derive(Default)]
pub(crate) struct ReaderProbe {
    handler: Mutex<Option<FrameHandler>>,
    requests: AtomicUsize,
    flushes: AtomicUsize,
    live_readers: AtomicUsize,
    pub(crate) fail_requests: AtomicBool,
}

impl ReaderProbe {
    /// Deliver `event` as the native subsystem would, on the calling thread.
    pub(crate) fn deliver(&self, event: FrameEvent) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler(event);
        }
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub(crate) fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub(crate) fn live_readers(&self) -> usize {
        self.live_readers.load(Ordering::SeqCst)
    }
}

pub(crate) struct FakeReader {
    probe: Arc<ReaderProbe>,
}

impl FakeReader {
    pub(crate) fn new(probe: Arc<ReaderProbe>) -> Self {
        probe.live_readers.fetch_add(1, Ordering::SeqCst);
        Self { probe }
    }
}

impl Drop for FakeReader {
    fn drop(&mut self) {
        *self.probe.handler.lock() = None;
        self.probe.live_readers.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MediaReader for FakeReader {
    fn set_frame_handler(&self, handler: FrameHandler) {
        *self.probe.handler.lock() = Some(handler);
    }

    fn request_frame(&self) -> Result<(), CaptureError> {
        if self.probe.fail_requests.load(Ordering::SeqCst) {
            return Err(CaptureError::Read("ReadSample failed (0xC00D36B2)".into()));
        }
        self.probe.requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn flush(&self) -> Result<(), CaptureError> {
        self.probe.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct FakeOpener {
    pub(crate) probe: Arc<ReaderProbe>,
    pub(crate) format: FormatDescriptor,
    pub(crate) fail_with: Option<CaptureError>,
    pub(crate) opens: AtomicUsize,
}

impl FakeOpener {
    pub(crate) fn new(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        Self {
            probe: Arc::new(ReaderProbe::default()),
            format: FormatDescriptor::pcm(channels, sample_rate, bits_per_sample).unwrap(),
            fail_with: None,
            opens: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(error: CaptureError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new(2, 48000, 16)
        }
    }
}

impl MediaSourceOpener for FakeOpener {
    type Reader = FakeReader;

    fn open(&self, _source: &MediaSource) -> Result<NegotiatedSource<FakeReader>, CaptureError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        // Reader exists before negotiation, as with a real source reader.
        let reader = FakeReader::new(Arc::clone(&self.probe));
        if let Some(ref e) = self.fail_with {
            drop(reader);
            return Err(e.clone());
        }
        Ok(NegotiatedSource {
            reader,
            format: self.format.clone(),
        })
    }
}

pub(crate) struct StaticEnumerator(pub(crate) Vec<AudioDevice>);

impl DeviceEnumerator for StaticEnumerator {
    fn list_devices(&self) -> Result<Vec<AudioDevice>, CaptureError> {
        Ok(self.0.clone())
    }
}
