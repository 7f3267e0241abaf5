//! Opening device and file sources and negotiating PCM output.

use windows::core::*;
use windows::Win32::Media::Audio::WAVEFORMATEX;
use windows::Win32::Media::MediaFoundation::*;
use windows::Win32::System::Com::CoTaskMemFree;

use pcm_capture_core::models::audio_models::AudioDevice;
use pcm_capture_core::models::error::CaptureError;
use pcm_capture_core::models::format::FormatDescriptor;
use pcm_capture_core::traits::media_source::{MediaSource, MediaSourceOpener, NegotiatedSource};

use crate::media_foundation::MediaFoundationRuntime;
use crate::source_reader::{reader_callback, MfSourceReader, FIRST_AUDIO_STREAM};

/// Opens Media Foundation sources as asynchronous PCM readers.
pub struct MfSourceOpener<'rt> {
    _runtime: &'rt MediaFoundationRuntime,
}

impl<'rt> MfSourceOpener<'rt> {
    pub fn new(runtime: &'rt MediaFoundationRuntime) -> Self {
        Self { _runtime: runtime }
    }
}

impl MediaSourceOpener for MfSourceOpener<'_> {
    type Reader = MfSourceReader;

    fn open(&self, source: &MediaSource) -> std::result::Result<NegotiatedSource<MfSourceReader>, CaptureError> {
        unsafe {
            let (callback, handler) = reader_callback();

            let mut attributes: Option<IMFAttributes> = None;
            MFCreateAttributes(&mut attributes, 1)
                .map_err(|e| CaptureError::SourceOpen(format!("MFCreateAttributes failed: {}", e)))?;
            let attributes = attributes
                .ok_or_else(|| CaptureError::SourceOpen("MFCreateAttributes returned null".into()))?;
            attributes
                .SetUnknown(&MF_SOURCE_READER_ASYNC_CALLBACK, &callback)
                .map_err(|e| CaptureError::SourceOpen(format!("SetUnknown(async callback) failed: {}", e)))?;

            let reader = match source {
                MediaSource::Device(device) => {
                    let media_source = activate_device(device)?;
                    let reader = MFCreateSourceReaderFromMediaSource(&media_source, &attributes);
                    // The reader holds its own reference to the media source.
                    drop(media_source);
                    reader.map_err(|e| {
                        CaptureError::SourceOpen(format!("MFCreateSourceReaderFromMediaSource failed: {}", e))
                    })?
                }
                MediaSource::File(path) => {
                    let url = HSTRING::from(path.as_os_str());
                    MFCreateSourceReaderFromURL(&url, &attributes).map_err(|e| {
                        CaptureError::SourceOpen(format!("failed to open {}: {}", path.display(), e))
                    })?
                }
            };

            // Wrap first so a negotiation error releases the reader on drop.
            let reader = MfSourceReader::new(reader, handler);
            let format = negotiate_pcm(reader.raw())?;
            Ok(NegotiatedSource { reader, format })
        }
    }
}

/// Create a media source for the capture endpoint named by `device`.
unsafe fn activate_device(device: &AudioDevice) -> std::result::Result<IMFMediaSource, CaptureError> {
    let open_err = |what: &str, e: Error| CaptureError::SourceOpen(format!("{} failed: {}", what, e));

    let mut attributes: Option<IMFAttributes> = None;
    MFCreateAttributes(&mut attributes, 2).map_err(|e| open_err("MFCreateAttributes", e))?;
    let attributes =
        attributes.ok_or_else(|| CaptureError::SourceOpen("MFCreateAttributes returned null".into()))?;

    attributes
        .SetGUID(
            &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE,
            &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_AUDCAP_GUID,
        )
        .map_err(|e| open_err("SetGUID(source type)", e))?;

    let endpoint = HSTRING::from(device.endpoint_id.as_str());
    attributes
        .SetString(&MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_AUDCAP_ENDPOINT_ID, &endpoint)
        .map_err(|e| open_err("SetString(endpoint id)", e))?;

    MFCreateDeviceSource(&attributes).map_err(|e| {
        CaptureError::SourceOpen(format!("activating {} failed: {}", device.name, e))
    })
}

/// Ask the reader for uncompressed PCM and describe what it settled on.
unsafe fn negotiate_pcm(reader: &IMFSourceReader) -> std::result::Result<FormatDescriptor, CaptureError> {
    let negotiation_err = |what: &str, e: Error| CaptureError::FormatNegotiation(format!("{} failed: {}", what, e));

    // Partial type: audio, PCM. Rate, depth and channels are left to the decoder.
    let partial = MFCreateMediaType().map_err(|e| negotiation_err("MFCreateMediaType", e))?;
    partial
        .SetGUID(&MF_MT_MAJOR_TYPE, &MFMediaType_Audio)
        .map_err(|e| negotiation_err("SetGUID(MF_MT_MAJOR_TYPE)", e))?;
    partial
        .SetGUID(&MF_MT_SUBTYPE, &MFAudioFormat_PCM)
        .map_err(|e| negotiation_err("SetGUID(MF_MT_SUBTYPE)", e))?;

    reader
        .SetCurrentMediaType(FIRST_AUDIO_STREAM, None, &partial)
        .map_err(|e| negotiation_err("SetCurrentMediaType", e))?;

    let resolved = reader
        .GetCurrentMediaType(FIRST_AUDIO_STREAM)
        .map_err(|e| negotiation_err("GetCurrentMediaType", e))?;

    reader
        .SetStreamSelection(FIRST_AUDIO_STREAM, true)
        .map_err(|e| negotiation_err("SetStreamSelection", e))?;

    let mut wave_format: *mut WAVEFORMATEX = std::ptr::null_mut();
    let mut size: u32 = 0;
    MFCreateWaveFormatExFromMFMediaType(
        &resolved,
        &mut wave_format,
        Some(&mut size as *mut u32),
        MFWaveFormatExConvertFlag_Normal.0 as u32,
    )
    .map_err(|e| negotiation_err("MFCreateWaveFormatExFromMFMediaType", e))?;

    if wave_format.is_null() {
        return Err(CaptureError::FormatNegotiation("no WAVEFORMATEX produced".into()));
    }
    let blob = std::slice::from_raw_parts(wave_format as *const u8, size as usize).to_vec();
    CoTaskMemFree(Some(wave_format as *const _));

    FormatDescriptor::from_header_blob(blob)
}
