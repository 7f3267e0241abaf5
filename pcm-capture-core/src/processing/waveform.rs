/// Reduce `samples` to at most `width` buckets by folding each bucket with `fold`.
///
/// Bucket `k` starts at `floor(k * len / width)` and spans `ceil(len / width)`
/// samples or fewer. Used to fit a long recording onto a fixed-width chart.
pub fn summarize<F>(samples: &[f32], width: usize, fold: F) -> Vec<f32>
where
    F: Fn(f32, f32) -> f32,
{
    if samples.is_empty() || width == 0 {
        return Vec::new();
    }
    if samples.len() <= width {
        return samples.to_vec();
    }

    let len = samples.len();
    let step = len as f64 / width as f64;
    let mut summary = Vec::with_capacity(width);
    for k in 0..width {
        let start = (k as f64 * step) as usize;
        let end = (((k + 1) as f64 * step) as usize).min(len);
        let bucket = &samples[start..end.max(start + 1)];
        let value = bucket[1..].iter().fold(bucket[0], |acc, &s| fold(acc, s));
        summary.push(value);
    }
    summary
}

/// Per-bucket absolute peak, suitable for drawing a waveform envelope.
pub fn peak_envelope(samples: &[f32], width: usize) -> Vec<f32> {
    let magnitudes: Vec<f32> = samples.iter().map(|s| s.abs()).collect();
    summarize(&magnitudes, width, f32::max)
}
