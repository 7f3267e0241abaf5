//! Media Foundation runtime lifetime.

use windows::Win32::Media::MediaFoundation::*;
use windows::Win32::System::Com::*;

use pcm_capture_core::models::error::CaptureError;

/// Keeps COM and Media Foundation started on the creating thread.
///
/// Create one before enumerating devices or opening sources; dropping it
/// calls `MFShutdown` and `CoUninitialize`.
pub struct MediaFoundationRuntime {
    _com: CoUninitializeGuard,
}

impl MediaFoundationRuntime {
    pub fn start() -> Result<Self, CaptureError> {
        unsafe {
            CoInitializeEx(None, COINIT_MULTITHREADED)
                .ok()
                .map_err(|e| CaptureError::SourceOpen(format!("CoInitializeEx failed: {}", e)))?;
            let com = CoUninitializeGuard;

            MFStartup(MF_VERSION, MFSTARTUP_LITE)
                .map_err(|e| CaptureError::SourceOpen(format!("MFStartup failed: {}", e)))?;

            log::debug!("Media Foundation started");
            Ok(Self { _com: com })
        }
    }
}

impl Drop for MediaFoundationRuntime {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = MFShutdown() {
                log::warn!("MFShutdown failed: {}", e);
            }
        }
    }
}

/// RAII guard to call CoUninitialize when dropped.
struct CoUninitializeGuard;

impl Drop for CoUninitializeGuard {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}
