use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::models::format::FormatDescriptor;
use crate::processing::wav_format::{self, ContainerInfo};

/// A container that has been finalized and closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedContainer {
    pub file_path: PathBuf,
    pub data_bytes: u64,
}

/// Streaming WAV container writer.
///
/// Writes a provisional header, appends PCM as frames arrive, and rewrites
/// the size fields on `finalize`. Not synchronized: the owner must ensure a
/// single writer at any instant.
///
/// ## File Format
///
/// ```text
/// ["RIFF" | total | "WAVE" | "fmt " | blob len | blob | "data" | data len]
/// [raw PCM data...]
/// ```
#[derive(Debug, Default)]
pub struct WavContainerWriter {
    file_path: Option<PathBuf>,
    file: Option<BufWriter<File>>,
    format_blob: Vec<u8>,
    data_bytes: u64,
}

impl WavContainerWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or truncate) the output file.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<(), CaptureError> {
        let path = path.as_ref();
        if self.file.is_some() {
            return Err(CaptureError::ContainerIo("container is already open".into()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::ContainerIo(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(path)
            .map_err(|e| CaptureError::ContainerIo(format!("failed to create file: {}", e)))?;

        self.file = Some(BufWriter::new(file));
        self.file_path = Some(path.to_path_buf());
        self.format_blob.clear();
        self.data_bytes = 0;
        Ok(())
    }

    /// Write the chunk headers with zero sizes. Must precede any `append_data`.
    pub fn write_provisional_header(&mut self, format: &FormatDescriptor) -> Result<(), CaptureError> {
        let header = wav_format::build_header(format.header_blob(), 0)?;
        let file = self.file_mut()?;
        file.write_all(&header)
            .map_err(|e| CaptureError::ContainerIo(format!("header write failed: {}", e)))?;
        self.format_blob = format.header_blob().to_vec();
        Ok(())
    }

    /// Append raw PCM bytes after everything written so far.
    pub fn append_data(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        if !wav_format::fits(self.format_blob.len(), self.data_bytes, data.len() as u64) {
            return Err(CaptureError::ContainerIo("container would exceed 4 GiB".into()));
        }
        let file = self.file_mut()?;
        file.write_all(data)
            .map_err(|e| CaptureError::ContainerIo(format!("write failed: {}", e)))?;
        self.data_bytes += data.len() as u64;
        Ok(())
    }

    /// Rewrite the header with the final sizes and close the file.
    ///
    /// Returns `Ok(None)` when no file is open. The file is closed even when
    /// the rewrite fails; its size fields are then left as they were.
    pub fn finalize(&mut self) -> Result<Option<FinalizedContainer>, CaptureError> {
        let Some(mut file) = self.file.take() else {
            return Ok(None);
        };
        let file_path = self.file_path.take().unwrap_or_default();
        let data_bytes = self.data_bytes;

        let io = |e: std::io::Error| CaptureError::ContainerIo(format!("finalize failed: {}", e));
        let header = wav_format::build_header(&self.format_blob, data_bytes)?;

        file.flush().map_err(io)?;
        let end = file.stream_position().map_err(io)?;
        file.seek(SeekFrom::Start(0)).map_err(io)?;
        file.write_all(&header).map_err(io)?;
        file.seek(SeekFrom::Start(end)).map_err(io)?;
        file.flush().map_err(io)?;
        file.get_ref().sync_all().map_err(io)?;

        log::info!(
            "finalized {} ({} data bytes)",
            file_path.display(),
            data_bytes
        );
        Ok(Some(FinalizedContainer { file_path, data_bytes }))
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// PCM bytes appended since `open`.
    pub fn data_bytes(&self) -> u64 {
        self.data_bytes
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    fn file_mut(&mut self) -> Result<&mut BufWriter<File>, CaptureError> {
        self.file
            .as_mut()
            .ok_or_else(|| CaptureError::ContainerIo("container is not open".into()))
    }
}

impl Drop for WavContainerWriter {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            log::warn!("failed to finalize container on drop: {}", e);
        }
    }
}

/// Parse the chunk headers of a container on disk.
pub fn read_container_info(path: &Path) -> Result<ContainerInfo, CaptureError> {
    let file = File::open(path)
        .map_err(|e| CaptureError::ContainerIo(format!("failed to open {}: {}", path.display(), e)))?;
    let mut head = Vec::with_capacity(128);
    file.take(4096)
        .read_to_end(&mut head)
        .map_err(|e| CaptureError::ContainerIo(e.to_string()))?;
    wav_format::parse_header(&head)
}

/// Compute SHA-256 hex digest of a file.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let mut file = File::open(path)
        .map_err(|e| CaptureError::ContainerIo(format!("failed to read file for checksum: {}", e)))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| CaptureError::ContainerIo(format!("failed to read file for checksum: {}", e)))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono16() -> FormatDescriptor {
        FormatDescriptor::pcm(1, 16000, 16).unwrap()
    }

    #[test]
    fn finalize_patches_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.wav");
        let format = mono16();

        let mut writer = WavContainerWriter::new();
        writer.open(&path).unwrap();
        writer.write_provisional_header(&format).unwrap();
        for len in [32, 64, 48] {
            writer.append_data(&vec![0x11; len]).unwrap();
        }

        let done = writer.finalize().unwrap().unwrap();
        assert_eq!(done.data_bytes, 144);
        assert_eq!(done.file_path, path);
        assert!(!writer.is_open());

        let info = read_container_info(&path).unwrap();
        assert_eq!(info.data_size, 144);
        assert_eq!(info.riff_size as usize, 20 + format.header_blob().len() + 8 + 144 - 8);
        assert_eq!(info.format_blob, format.header_blob());

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len() as u64, info.data_offset + 144);
        assert!(bytes[info.data_offset as usize..].iter().all(|b| *b == 0x11));
    }

    #[test]
    fn provisional_header_has_zero_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provisional.wav");

        let mut writer = WavContainerWriter::new();
        writer.open(&path).unwrap();
        writer.write_provisional_header(&mono16()).unwrap();
        writer.append_data(&[1, 2, 3, 4]).unwrap();
        writer.file.as_mut().unwrap().flush().unwrap();

        let info = read_container_info(&path).unwrap();
        assert_eq!(info.data_size, 0);
        assert_eq!(info.riff_size, 20 + 18 + 8 - 8);

        writer.finalize().unwrap();
    }

    #[test]
    fn empty_container_is_playable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");

        let mut writer = WavContainerWriter::new();
        writer.open(&path).unwrap();
        writer.write_provisional_header(&mono16()).unwrap();
        writer.finalize().unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let wav = reader.spec();
        assert_eq!(wav.channels, 1);
        assert_eq!(wav.sample_rate, 16000);
        assert_eq!(wav.bits_per_sample, 16);
        assert_eq!(reader.len(), 0);
    }

    #[test]
    fn written_samples_read_back_with_hound() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.wav");
        let values: [i16; 4] = [0, 1000, -1000, i16::MAX];
        let pcm: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();

        let mut writer = WavContainerWriter::new();
        writer.open(&path).unwrap();
        writer.write_provisional_header(&mono16()).unwrap();
        writer.append_data(&pcm).unwrap();
        writer.finalize().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, values);
    }

    #[test]
    fn finalize_without_open_is_noop() {
        let mut writer = WavContainerWriter::new();
        assert_eq!(writer.finalize().unwrap(), None);
    }

    #[test]
    fn second_finalize_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twice.wav");

        let mut writer = WavContainerWriter::new();
        writer.open(&path).unwrap();
        writer.write_provisional_header(&mono16()).unwrap();
        writer.append_data(&[0; 8]).unwrap();
        writer.finalize().unwrap();
        let first = fs::read(&path).unwrap();

        assert_eq!(writer.finalize().unwrap(), None);
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn open_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reuse.wav");
        fs::write(&path, vec![0xFF; 1000]).unwrap();

        let mut writer = WavContainerWriter::new();
        writer.open(&path).unwrap();
        writer.write_provisional_header(&mono16()).unwrap();
        writer.finalize().unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), 46);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("a.wav");

        let mut writer = WavContainerWriter::new();
        writer.open(&path).unwrap();
        assert!(writer.is_open());
        assert_eq!(writer.file_path(), Some(path.as_path()));
        writer.finalize().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn append_without_open_fails() {
        let mut writer = WavContainerWriter::new();
        assert!(matches!(writer.append_data(&[0; 4]), Err(CaptureError::ContainerIo(_))));
    }

    #[test]
    fn drop_finalizes_open_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dropped.wav");
        {
            let mut writer = WavContainerWriter::new();
            writer.open(&path).unwrap();
            writer.write_provisional_header(&mono16()).unwrap();
            writer.append_data(&[0; 10]).unwrap();
        }
        assert_eq!(read_container_info(&path).unwrap().data_size, 10);
    }

    #[test]
    fn checksum_is_stable_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sum.bin");
        fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
