use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::format::FormatDescriptor;

/// Returned by `stop` when a container was finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub data_bytes: u64,
    pub duration_secs: f64,
    pub format: FormatDescriptor,
    pub checksum: String,
}

impl RecordingResult {
    pub fn metadata(&self) -> RecordingMetadata {
        RecordingMetadata::new(self)
    }
}

/// Metadata stored alongside a recording.
///
/// Serializable for the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub data_bytes: u64,
    pub duration_secs: f64,
    pub checksum: String,
}

impl RecordingMetadata {
    pub fn new(result: &RecordingResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: result.file_path.to_string_lossy().into_owned(),
            channels: result.format.channels(),
            sample_rate: result.format.sample_rate(),
            bits_per_sample: result.format.bits_per_sample(),
            data_bytes: result.data_bytes,
            duration_secs: result.duration_secs,
            checksum: result.checksum.clone(),
        }
    }
}
