//! WAV (RIFF) container layout.
//!
//! The container is three chunks, all little-endian:
//!
//! ```text
//! "RIFF" <u32 total size> "WAVE"
//! "fmt " <u32 blob length> <format blob, verbatim>
//! "data" <u32 data length> <raw PCM bytes...>
//! ```
//!
//! The total size excludes the 8 bytes of the outer tag and size field:
//! `20 + blob + 8 + data - 8`.

use crate::models::error::CaptureError;

/// `WAVE_FORMAT_PCM` format tag.
pub const WAVE_FORMAT_PCM: u16 = 0x0001;

/// `WAVE_FORMAT_EXTENSIBLE` format tag.
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Size of a `WAVEFORMATEX` structure including its `cbSize` field.
pub const WAVE_FORMAT_EX_SIZE: usize = 18;

/// Outer chunk tag + size + form type, then the format chunk tag + size.
pub const OUTER_AND_FMT_HEADER_SIZE: u64 = 5 * 4;

/// Data chunk tag + size.
pub const DATA_HEADER_SIZE: u64 = 2 * 4;

/// Fields of a `WAVEFORMATEX`-layout blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

/// Build an 18-byte PCM `WAVEFORMATEX` blob.
///
/// Layout:
/// ```text
/// [0-1]    format tag (1 = PCM)
/// [2-3]    channels
/// [4-7]    sample rate
/// [8-11]   byte rate = sample_rate * block_align
/// [12-13]  block align = channels * bits / 8
/// [14-15]  bits per sample
/// [16-17]  extra size (0)
/// ```
///
/// Sizes that overflow their fields are written as zero; see `frame_sizes`.
pub fn wave_format_ex(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Vec<u8> {
    let (block_align, byte_rate) = frame_sizes(channels, sample_rate, bits_per_sample).unwrap_or((0, 0));

    let mut blob = Vec::with_capacity(WAVE_FORMAT_EX_SIZE);
    blob.extend_from_slice(&WAVE_FORMAT_PCM.to_le_bytes());
    blob.extend_from_slice(&channels.to_le_bytes());
    blob.extend_from_slice(&sample_rate.to_le_bytes());
    blob.extend_from_slice(&byte_rate.to_le_bytes());
    blob.extend_from_slice(&block_align.to_le_bytes());
    blob.extend_from_slice(&bits_per_sample.to_le_bytes());
    blob.extend_from_slice(&0u16.to_le_bytes());
    blob
}

/// `(block_align, byte_rate)` for a PCM layout, or `None` if either
/// overflows its 16/32-bit header field.
pub fn frame_sizes(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Option<(u16, u32)> {
    let block_align = u16::try_from(u32::from(channels) * u32::from(bits_per_sample) / 8).ok()?;
    let byte_rate = sample_rate.checked_mul(u32::from(block_align))?;
    Some((block_align, byte_rate))
}

/// Read the leading `WAVEFORMAT` fields of a format blob.
///
/// Returns `None` if the blob is shorter than the 16-byte PCM minimum.
pub fn parse_wave_format(blob: &[u8]) -> Option<WaveFormat> {
    if blob.len() < 16 {
        return None;
    }
    Some(WaveFormat {
        format_tag: read_u16(blob, 0),
        channels: read_u16(blob, 2),
        sample_rate: read_u32(blob, 4),
        byte_rate: read_u32(blob, 8),
        block_align: read_u16(blob, 12),
        bits_per_sample: read_u16(blob, 14),
    })
}

/// Header length (everything before the first PCM byte) for a given blob length.
pub fn header_len(blob_len: usize) -> u64 {
    OUTER_AND_FMT_HEADER_SIZE + blob_len as u64 + DATA_HEADER_SIZE
}

/// Value of the outer chunk's size field.
pub fn riff_size(blob_len: usize, data_len: u64) -> u64 {
    header_len(blob_len) + data_len - 8
}

/// Byte offset of the data chunk's size field.
pub fn data_size_offset(blob_len: usize) -> u64 {
    OUTER_AND_FMT_HEADER_SIZE + blob_len as u64 + 4
}

/// Whether `extra` more data bytes still fit in the 32-bit size fields.
pub fn fits(blob_len: usize, data_len: u64, extra: u64) -> bool {
    riff_size(blob_len, data_len.saturating_add(extra)) <= u32::MAX as u64
}

/// Serialize the three chunk headers for `blob` and `data_len` PCM bytes.
pub fn build_header(blob: &[u8], data_len: u64) -> Result<Vec<u8>, CaptureError> {
    let total = riff_size(blob.len(), data_len);
    let total = u32::try_from(total)
        .map_err(|_| CaptureError::ContainerIo(format!("container size {} exceeds 4 GiB", total)))?;
    let blob_len = u32::try_from(blob.len())
        .map_err(|_| CaptureError::ContainerIo("format blob too large".into()))?;
    let data_len = data_len as u32;

    let mut header = Vec::with_capacity(header_len(blob.len()) as usize);
    header.extend_from_slice(b"RIFF");
    header.extend_from_slice(&total.to_le_bytes());
    header.extend_from_slice(b"WAVE");
    header.extend_from_slice(b"fmt ");
    header.extend_from_slice(&blob_len.to_le_bytes());
    header.extend_from_slice(blob);
    header.extend_from_slice(b"data");
    header.extend_from_slice(&data_len.to_le_bytes());
    Ok(header)
}

/// Parsed chunk headers of a container written by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub riff_size: u32,
    pub format_blob: Vec<u8>,
    pub data_size: u32,
    /// Offset of the first PCM byte.
    pub data_offset: u64,
}

/// Parse the outer, format and data chunk headers from the start of a file.
pub fn parse_header(bytes: &[u8]) -> Result<ContainerInfo, CaptureError> {
    let malformed = |what: &str| CaptureError::ContainerIo(format!("malformed container: {}", what));

    if bytes.len() < 20 {
        return Err(malformed("truncated outer chunk"));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(malformed("missing RIFF/WAVE tags"));
    }
    if &bytes[12..16] != b"fmt " {
        return Err(malformed("missing fmt chunk"));
    }

    let riff_size = read_u32(bytes, 4);
    let blob_len = read_u32(bytes, 16) as usize;
    let blob_end = 20 + blob_len;
    if bytes.len() < blob_end + 8 {
        return Err(malformed("truncated fmt chunk"));
    }
    if &bytes[blob_end..blob_end + 4] != b"data" {
        return Err(malformed("missing data chunk"));
    }

    Ok(ContainerInfo {
        riff_size,
        format_blob: bytes[20..blob_end].to_vec(),
        data_size: read_u32(bytes, blob_end + 4),
        data_offset: header_len(blob_len),
    })
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
