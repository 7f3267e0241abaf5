//! Asynchronous `IMFSourceReader` wrapper.
//!
//! The reader is created with `MF_SOURCE_READER_ASYNC_CALLBACK`, so every
//! `ReadSample` returns immediately and completes on a Media Foundation work
//! queue thread through `OnReadSample`. Each completion becomes one
//! `FrameEvent` for the bound handler.

use std::sync::Arc;

use parking_lot::Mutex;
use windows::core::*;
use windows::Win32::Media::MediaFoundation::*;

use pcm_capture_core::models::audio_models::FrameEvent;
use pcm_capture_core::models::error::CaptureError;
use pcm_capture_core::traits::media_source::{FrameHandler, MediaReader};

pub(crate) const FIRST_AUDIO_STREAM: u32 = MF_SOURCE_READER_FIRST_AUDIO_STREAM.0 as u32;

type HandlerSlot = Arc<Mutex<Option<FrameHandler>>>;

/// Source reader negotiated to PCM, delivering frames asynchronously.
pub struct MfSourceReader {
    reader: IMFSourceReader,
    handler: HandlerSlot,
}

// SAFETY: the source reader is free-threaded when created with an async
// callback; the handler slot is Mutex-protected.
unsafe impl Send for MfSourceReader {}
unsafe impl Sync for MfSourceReader {}

impl MfSourceReader {
    pub(crate) fn new(reader: IMFSourceReader, handler: HandlerSlot) -> Self {
        Self { reader, handler }
    }

    pub(crate) fn raw(&self) -> &IMFSourceReader {
        &self.reader
    }
}

impl MediaReader for MfSourceReader {
    fn set_frame_handler(&self, handler: FrameHandler) {
        *self.handler.lock() = Some(handler);
    }

    fn request_frame(&self) -> std::result::Result<(), CaptureError> {
        unsafe {
            self.reader
                .ReadSample(FIRST_AUDIO_STREAM, 0, None, None, None, None)
                .map_err(|e| CaptureError::Read(format!("ReadSample failed: {}", e)))
        }
    }

    fn flush(&self) -> std::result::Result<(), CaptureError> {
        unsafe {
            self.reader
                .Flush(FIRST_AUDIO_STREAM)
                .map_err(|e| CaptureError::Read(format!("Flush failed: {}", e)))
        }
    }
}

impl Drop for MfSourceReader {
    fn drop(&mut self) {
        // Break the callback → handler → session link before the COM reference goes.
        self.handler.lock().take();
    }
}

/// Create the COM callback object and the slot it forwards deliveries to.
pub(crate) fn reader_callback() -> (IMFSourceReaderCallback, HandlerSlot) {
    let slot: HandlerSlot = Arc::new(Mutex::new(None));
    let callback: IMFSourceReaderCallback = ReaderCallback {
        handler: Arc::clone(&slot),
    }
    .into();
    (callback, slot)
}

#[implement(IMFSourceReaderCallback)]
struct ReaderCallback {
    handler: HandlerSlot,
}

impl ReaderCallback {
    fn dispatch(&self, event: FrameEvent) {
        let handler = self.handler.lock().clone();
        match handler {
            Some(handler) => handler(event),
            None => log::debug!("frame delivered with no handler bound"),
        }
    }
}

impl IMFSourceReaderCallback_Impl for ReaderCallback_Impl {
    fn OnReadSample(
        &self,
        hrstatus: HRESULT,
        _dwstreamindex: u32,
        dwstreamflags: u32,
        _lltimestamp: i64,
        psample: Ref<'_, IMFSample>,
    ) -> Result<()> {
        let end_of_stream = dwstreamflags & MF_SOURCE_READERF_ENDOFSTREAM.0 as u32 != 0;

        let event = if hrstatus.is_err() {
            FrameEvent::Failed(format!("{}", Error::from(hrstatus)))
        } else {
            match psample.as_ref() {
                None => FrameEvent::Sample {
                    data: None,
                    end_of_stream,
                },
                Some(sample) => match unsafe { copy_sample(sample) } {
                    Ok(bytes) => FrameEvent::data(bytes, end_of_stream),
                    Err(e) => FrameEvent::Failed(format!("ConvertToContiguousBuffer failed: {}", e)),
                },
            }
        };

        self.dispatch(event);
        Ok(())
    }

    fn OnFlush(&self, dwstreamindex: u32) -> Result<()> {
        log::debug!("stream {} flushed", dwstreamindex);
        Ok(())
    }

    fn OnEvent(&self, dwstreamindex: u32, pevent: Ref<'_, IMFMediaEvent>) -> Result<()> {
        if let Some(event) = pevent.as_ref() {
            if let Ok(kind) = unsafe { event.GetType() } {
                log::debug!("stream {} media event {}", dwstreamindex, kind);
            }
        }
        Ok(())
    }
}

/// Copy a sample's payload into an owned buffer.
unsafe fn copy_sample(sample: &IMFSample) -> Result<Vec<u8>> {
    let buffer = sample.ConvertToContiguousBuffer()?;

    let mut ptr: *mut u8 = std::ptr::null_mut();
    let mut current_length: u32 = 0;
    buffer.Lock(&mut ptr, None, Some(&mut current_length as *mut u32))?;

    let bytes = if ptr.is_null() || current_length == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(ptr, current_length as usize).to_vec()
    };

    buffer.Unlock()?;
    Ok(bytes)
}
