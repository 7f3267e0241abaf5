//! # pcm-capture-windows
//!
//! Windows Media Foundation backend for pcm-capture.
//!
//! Provides:
//! - `MediaFoundationRuntime` — COM + `MFStartup` lifetime guard
//! - `MfDeviceEnumerator` — audio capture devices via `MFEnumDeviceSources`
//! - `MfSourceOpener` — device or file sources negotiated to PCM
//! - `MfSourceReader` — asynchronous `IMFSourceReader` delivering frame events
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use pcm_capture_core::{CaptureConfiguration, DeviceEnumerator, DeviceRecorder};
//! use pcm_capture_windows::{MediaFoundationRuntime, MfDeviceEnumerator, MfSourceOpener};
//!
//! let runtime = MediaFoundationRuntime::start()?;
//! let devices = MfDeviceEnumerator::new(&runtime).list_devices()?;
//! let mut recorder = DeviceRecorder::new(
//!     MfSourceOpener::new(&runtime),
//!     devices[0].clone(),
//!     CaptureConfiguration::default(),
//! )?;
//! let path = recorder.start(Arc::new(|sample| println!("{:?}", sample.data.as_ref().map(Vec::len))))?;
//! // ...
//! let result = recorder.stop()?;
//! ```

#[cfg(target_os = "windows")]
pub mod device_enumerator;
#[cfg(target_os = "windows")]
pub mod media_foundation;
#[cfg(target_os = "windows")]
pub mod source_opener;
#[cfg(target_os = "windows")]
pub mod source_reader;

#[cfg(target_os = "windows")]
pub use device_enumerator::MfDeviceEnumerator;
#[cfg(target_os = "windows")]
pub use media_foundation::MediaFoundationRuntime;
#[cfg(target_os = "windows")]
pub use source_opener::MfSourceOpener;
#[cfg(target_os = "windows")]
pub use source_reader::MfSourceReader;
