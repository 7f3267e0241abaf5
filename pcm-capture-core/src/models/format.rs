use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use crate::processing::wav_format::{self, WAVE_FORMAT_EXTENSIBLE, WAVE_FORMAT_PCM};

/// Bit depths the pipeline can stream and convert.
pub const SUPPORTED_BIT_DEPTHS: [u16; 3] = [8, 16, 32];

/// A negotiated, uncompressed PCM format.
///
/// `header_blob` is the `WAVEFORMATEX`-layout structure produced during
/// negotiation and is written verbatim as the body of the `fmt ` chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    header_blob: Vec<u8>,
}

impl FormatDescriptor {
    /// Describe plain PCM and synthesize its 18-byte format blob.
    pub fn pcm(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Result<Self, CaptureError> {
        validate(channels, sample_rate, bits_per_sample)?;
        Ok(Self {
            channels,
            sample_rate,
            bits_per_sample,
            header_blob: wav_format::wave_format_ex(channels, sample_rate, bits_per_sample),
        })
    }

    /// Build a descriptor from a resolved format blob, keeping the blob as-is.
    pub fn from_header_blob(blob: Vec<u8>) -> Result<Self, CaptureError> {
        let format = wav_format::parse_wave_format(&blob).ok_or_else(|| {
            CaptureError::FormatNegotiation(format!("format blob too short ({} bytes)", blob.len()))
        })?;

        if format.format_tag != WAVE_FORMAT_PCM && format.format_tag != WAVE_FORMAT_EXTENSIBLE {
            return Err(CaptureError::FormatNegotiation(format!(
                "format tag {:#06x} is not PCM",
                format.format_tag
            )));
        }
        validate(format.channels, format.sample_rate, format.bits_per_sample)?;

        Ok(Self {
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: format.bits_per_sample,
            header_blob: blob,
        })
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    pub fn header_blob(&self) -> &[u8] {
        &self.header_blob
    }

    /// Bytes per interleaved frame (all channels).
    pub fn block_align(&self) -> u32 {
        self.channels as u32 * self.bits_per_sample as u32 / 8
    }

    pub fn byte_rate(&self) -> u64 {
        u64::from(self.sample_rate) * u64::from(self.block_align())
    }

    /// Playback duration of `data_bytes` bytes of PCM in this format.
    pub fn duration_secs(&self, data_bytes: u64) -> f64 {
        data_bytes as f64 / self.byte_rate() as f64
    }
}

fn validate(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Result<(), CaptureError> {
    if channels == 0 {
        return Err(CaptureError::FormatNegotiation("channel count must be positive".into()));
    }
    if sample_rate == 0 {
        return Err(CaptureError::FormatNegotiation("sample rate must be positive".into()));
    }
    if !SUPPORTED_BIT_DEPTHS.contains(&bits_per_sample) {
        return Err(CaptureError::FormatNegotiation(format!(
            "unsupported bit depth: {}",
            bits_per_sample
        )));
    }
    if wav_format::frame_sizes(channels, sample_rate, bits_per_sample).is_none() {
        return Err(CaptureError::FormatNegotiation(format!(
            "{} ch at {} Hz overflows the WAV size fields",
            channels, sample_rate
        )));
    }
    Ok(())
}
