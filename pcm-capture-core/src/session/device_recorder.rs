use std::path::PathBuf;

use crate::models::audio_models::AudioDevice;
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::storage::metadata;
use crate::traits::media_source::{MediaSource, MediaSourceOpener};

use super::pump::SampleCallback;
use super::recording::RecordingSession;

/// Records from one capture device into numbered WAV files.
///
/// The device is activated lazily on the first `start`; the same session is
/// reused for every later start/stop cycle until `dispose`.
pub struct DeviceRecorder<O: MediaSourceOpener> {
    opener: O,
    device: AudioDevice,
    config: CaptureConfiguration,
    session: Option<RecordingSession<O::Reader>>,
}

impl<O: MediaSourceOpener> DeviceRecorder<O> {
    pub fn new(opener: O, device: AudioDevice, config: CaptureConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(Self {
            opener,
            device,
            config,
            session: None,
        })
    }

    pub fn device(&self) -> &AudioDevice {
        &self.device
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    /// The underlying session, once the device has been activated.
    pub fn session(&self) -> Option<&RecordingSession<O::Reader>> {
        self.session.as_ref()
    }

    pub fn state(&self) -> CaptureState {
        self.session
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(CaptureState::Idle)
    }

    /// Start recording into the next free `{stem}{n}.wav`. Returns its path.
    pub fn start(&mut self, callback: SampleCallback) -> Result<PathBuf, CaptureError> {
        let path = self.config.next_recording_path()?;
        self.start_to(path.clone(), callback)?;
        Ok(path)
    }

    /// Start recording into `path`.
    ///
    /// A recording already in progress is stopped first, as `stop` would.
    pub fn start_to(&mut self, path: PathBuf, callback: SampleCallback) -> Result<(), CaptureError> {
        if self.session.as_ref().is_some_and(|s| s.is_active()) {
            if let Some(previous) = self.stop()? {
                log::info!("finished {} before restarting", previous.file_path.display());
            }
        }
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                log::info!("activating capture device {}", self.device);
                RecordingSession::open(&self.opener, &MediaSource::Device(self.device.clone()))?
            }
        };
        self.session.insert(session).start(path, callback)
    }

    /// Stop and finalize the current recording, writing its metadata sidecar
    /// if configured. The device stays activated.
    pub fn stop(&mut self) -> Result<Option<RecordingResult>, CaptureError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(None);
        };
        let result = session.stop()?;
        if let Some(ref result) = result {
            if self.config.write_metadata {
                let path = metadata::write_metadata(&result.metadata(), &result.file_path)?;
                log::debug!("wrote metadata sidecar {}", path.display());
            }
        }
        Ok(result)
    }

    /// Release the device. A later `start` activates it again.
    pub fn dispose(&mut self) {
        if let Some(session) = self.session.take() {
            session.dispose();
        }
    }
}
