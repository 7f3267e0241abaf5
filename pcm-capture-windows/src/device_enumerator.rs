//! Capture device enumeration via `MFEnumDeviceSources`.

use windows::core::*;
use windows::Win32::Media::MediaFoundation::*;
use windows::Win32::System::Com::StructuredStorage::PropVariantClear;
use windows::Win32::System::Com::*;
use windows::Win32::System::Variant::*;

use pcm_capture_core::models::audio_models::{AudioDevice, DeviceAttribute};
use pcm_capture_core::models::error::CaptureError;
use pcm_capture_core::traits::media_source::DeviceEnumerator;

use crate::media_foundation::MediaFoundationRuntime;

/// Lists audio capture devices known to Media Foundation.
pub struct MfDeviceEnumerator<'rt> {
    _runtime: &'rt MediaFoundationRuntime,
}

impl<'rt> MfDeviceEnumerator<'rt> {
    pub fn new(runtime: &'rt MediaFoundationRuntime) -> Self {
        Self { _runtime: runtime }
    }
}

impl DeviceEnumerator for MfDeviceEnumerator<'_> {
    fn list_devices(&self) -> std::result::Result<Vec<AudioDevice>, CaptureError> {
        unsafe {
            let mut attributes: Option<IMFAttributes> = None;
            MFCreateAttributes(&mut attributes, 1)
                .map_err(|e| CaptureError::Enumeration(format!("MFCreateAttributes failed: {}", e)))?;
            let attributes = attributes
                .ok_or_else(|| CaptureError::Enumeration("MFCreateAttributes returned null".into()))?;

            // Request audio capture devices.
            attributes
                .SetGUID(
                    &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE,
                    &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_AUDCAP_GUID,
                )
                .map_err(|e| CaptureError::Enumeration(format!("SetGUID(source type) failed: {}", e)))?;

            let mut activates: *mut Option<IMFActivate> = std::ptr::null_mut();
            let mut count: u32 = 0;
            MFEnumDeviceSources(&attributes, &mut activates, &mut count)
                .map_err(|e| CaptureError::Enumeration(format!("MFEnumDeviceSources failed: {}", e)))?;

            let mut devices = Vec::with_capacity(count as usize);
            if !activates.is_null() {
                // Taking each element releases its reference as it drops.
                let slots = std::slice::from_raw_parts_mut(activates, count as usize);
                for slot in slots.iter_mut() {
                    if let Some(activate) = slot.take() {
                        devices.push(device_from_activate(&activate));
                    }
                }
                CoTaskMemFree(Some(activates as *const _));
            }

            log::info!("found {} audio capture device(s)", devices.len());
            Ok(devices)
        }
    }
}

/// Walk the activation object's attribute store, keeping the keys we know.
unsafe fn device_from_activate(activate: &IMFActivate) -> AudioDevice {
    let count = activate.GetCount().unwrap_or(0);
    let mut attributes = Vec::new();

    for index in 0..count {
        let mut key = GUID::zeroed();
        let mut value = std::mem::zeroed::<PROPVARIANT>();
        if activate.GetItemByIndex(index, &mut key, Some(&mut value as *mut PROPVARIANT)).is_err() {
            continue;
        }

        let attribute = if key == MF_DEVSOURCE_ATTRIBUTE_FRIENDLY_NAME {
            DeviceAttribute::FriendlyName
        } else if key == MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_AUDCAP_SYMBOLIC_LINK {
            DeviceAttribute::SymbolicLink
        } else if key == MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_AUDCAP_ENDPOINT_ID {
            DeviceAttribute::EndpointId
        } else {
            DeviceAttribute::Other
        };

        if attribute != DeviceAttribute::Other {
            if let Some(text) = propvariant_string(&value) {
                attributes.push((attribute, text));
            }
        } else {
            log::trace!("skipping device attribute {:?}", key);
        }
        PropVariantClear(&mut value).ok();
    }

    AudioDevice::from_attributes(attributes)
}

/// Read a `VT_LPWSTR` value as a `String`.
unsafe fn propvariant_string(value: &PROPVARIANT) -> Option<String> {
    if value.Anonymous.Anonymous.vt != VT_LPWSTR {
        return None;
    }
    let pwsz = value.Anonymous.Anonymous.Anonymous.pwszVal;
    if pwsz.is_null() {
        return None;
    }
    pwsz.to_string().ok()
}
