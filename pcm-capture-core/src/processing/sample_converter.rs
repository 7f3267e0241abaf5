//! Raw PCM bytes → normalized `f32` samples for visualization.

use crate::models::error::CaptureError;

/// Convert little-endian signed PCM bytes to floats in roughly `[-1.0, 1.0]`.
///
/// Each sample is a signed integer of `bits_per_sample / 8` bytes (1, 2 or 4)
/// divided by `2^(bits_per_sample - 1)`. Trailing bytes that do not make up
/// a whole sample are ignored.
pub fn to_float(bytes: &[u8], bits_per_sample: u16) -> Result<Vec<f32>, CaptureError> {
    let width = bits_per_sample as usize / 8;
    if !matches!(width, 1 | 2 | 4) || bits_per_sample % 8 != 0 {
        return Err(CaptureError::UnsupportedSampleWidth(width));
    }

    let range = 2f64.powi(bits_per_sample as i32 - 1);
    let samples = bytes
        .chunks_exact(width)
        .map(|chunk| {
            let value = match width {
                1 => chunk[0] as i8 as f64,
                2 => i16::from_le_bytes([chunk[0], chunk[1]]) as f64,
                _ => i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
            };
            (value / range) as f32
        })
        .collect();
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn eight_bit_is_signed() {
        let floats = to_float(&[0x40, 0xC0, 0x7F, 0x80], 8).unwrap();
        assert_relative_eq!(floats[0], 0.5);
        assert_relative_eq!(floats[1], -0.5);
        assert_relative_eq!(floats[2], 127.0 / 128.0);
        assert_relative_eq!(floats[3], -1.0);
    }

    #[test]
    fn sixteen_bit_round_trip() {
        let values: [i16; 5] = [0, 1, -1, i16::MAX, i16::MIN];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let floats = to_float(&bytes, 16).unwrap();

        assert_eq!(floats.len(), values.len());
        for (f, v) in floats.iter().zip(values) {
            assert_relative_eq!(*f, v as f32 / 32768.0, max_relative = 1e-6);
        }
    }

    #[test]
    fn thirty_two_bit_round_trip() {
        let values: [i32; 4] = [0, 1 << 30, -(1 << 30), i32::MIN];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let floats = to_float(&bytes, 32).unwrap();

        assert_relative_eq!(floats[0], 0.0);
        assert_relative_eq!(floats[1], 0.5);
        assert_relative_eq!(floats[2], -0.5);
        assert_relative_eq!(floats[3], -1.0);
    }

    #[test]
    fn trailing_partial_sample_is_ignored() {
        let floats = to_float(&[0, 0x40, 0x11], 16).unwrap();
        assert_eq!(floats.len(), 1);
        assert_relative_eq!(floats[0], 0.5);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(to_float(&[], 16).unwrap().is_empty());
    }

    #[test]
    fn unsupported_widths_fail() {
        assert_eq!(to_float(&[0; 6], 24), Err(CaptureError::UnsupportedSampleWidth(3)));
        assert_eq!(to_float(&[0; 8], 64), Err(CaptureError::UnsupportedSampleWidth(8)));
        assert_eq!(to_float(&[0; 2], 12), Err(CaptureError::UnsupportedSampleWidth(1)));
    }
}
