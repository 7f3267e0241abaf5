use std::fs;
use std::path::{Path, PathBuf};

use super::error::CaptureError;

/// Configuration for recordings made through a `DeviceRecorder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfiguration {
    /// Directory where recording files are written.
    pub output_directory: PathBuf,

    /// File name prefix; recordings are named `{stem}{index}.wav`.
    pub file_stem: String,

    /// Write a `.metadata.json` sidecar next to each finalized recording.
    pub write_metadata: bool,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.output_directory.as_os_str().is_empty() {
            return Err("output directory must not be empty".into());
        }
        if self.file_stem.is_empty() {
            return Err("file stem must not be empty".into());
        }
        if self.file_stem.contains(['/', '\\']) {
            return Err(format!("file stem contains a path separator: {}", self.file_stem));
        }
        Ok(())
    }

    /// First `{stem}{index}.wav` in the output directory that does not exist yet.
    ///
    /// Creates the output directory if needed.
    pub fn next_recording_path(&self) -> Result<PathBuf, CaptureError> {
        self.validate().map_err(CaptureError::ConfigurationFailed)?;
        fs::create_dir_all(&self.output_directory).map_err(|e| {
            CaptureError::ContainerIo(format!("failed to create directory: {}", e))
        })?;

        let mut index = 0u32;
        loop {
            let candidate = self
                .output_directory
                .join(format!("{}{}.wav", self.file_stem, index));
            if !candidate.exists() {
                return Ok(candidate);
            }
            index += 1;
        }
    }

    /// Where a transcode of `source` should be written.
    ///
    /// A `.wav` source is only measured in place, so its own path is returned;
    /// anything else gets the next free recording path.
    pub fn transcode_destination(&self, source: &Path) -> Result<PathBuf, CaptureError> {
        let is_wav = source
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);
        if is_wav {
            Ok(source.to_path_buf())
        } else {
            self.next_recording_path()
        }
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        let base = dirs_next::audio_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            output_directory: base.join("AudioTool"),
            file_stem: "Recording".into(),
            write_metadata: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> CaptureConfiguration {
        CaptureConfiguration {
            output_directory: dir.join("AudioTool"),
            ..Default::default()
        }
    }

    #[test]
    fn default_is_valid() {
        let config = CaptureConfiguration::default();
        assert!(config.validate().is_ok());
        assert!(config.output_directory.ends_with("AudioTool"));
    }

    #[test]
    fn rejects_bad_stem() {
        let config = CaptureConfiguration {
            file_stem: "a/b".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CaptureConfiguration {
            file_stem: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.next_recording_path(),
            Err(CaptureError::ConfigurationFailed(_))
        ));
    }

    #[test]
    fn next_recording_path_skips_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let first = config.next_recording_path().unwrap();
        assert!(first.ends_with("Recording0.wav"));

        fs::write(&first, b"").unwrap();
        fs::write(config.output_directory.join("Recording1.wav"), b"").unwrap();

        let next = config.next_recording_path().unwrap();
        assert!(next.ends_with("Recording2.wav"));
    }

    #[test]
    fn wav_sources_are_measured_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let wav = dir.path().join("take.WAV");
        assert_eq!(config.transcode_destination(&wav).unwrap(), wav);

        let mp3 = dir.path().join("take.mp3");
        let dest = config.transcode_destination(&mp3).unwrap();
        assert!(dest.ends_with("Recording0.wav"));
    }
}
