//! Channel downmixing and resampling to the canonical rate.
//!
//! Ingestion expects every sample sequence at 16 kHz mono, while corpus
//! clips arrive at whatever rate and channel count they were recorded with.
//! Two conversion steps:
//!
//! 1. [`downmix_mono`] — average interleaved channels into one.
//! 2. [`resample_to_canonical`] — linear interpolation to
//!    [`CANONICAL_SAMPLE_RATE`]. Linear is plenty for ML training material;
//!    a band-limited resampler would only matter for listening quality.

use super::CANONICAL_SAMPLE_RATE;

// ---------------------------------------------------------------------------
// downmix_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging each frame.
///
/// The output holds `samples.len() / channels` frames. A trailing partial
/// frame is dropped. `channels == 1` returns the input as an owned `Vec`;
/// `channels == 0` returns an empty vector.
pub fn downmix_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let width = n as usize;
            samples
                .chunks_exact(width)
                .map(|frame| frame.iter().sum::<f32>() / width as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample_to_canonical
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` Hz to the canonical 16 kHz by
/// linear interpolation between adjacent source samples.
///
/// A `source_rate` equal to the canonical rate is a no-op copy. The output
/// length is `ceil(samples.len() * 16_000 / source_rate)`.
pub fn resample_to_canonical(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == CANONICAL_SAMPLE_RATE {
        return samples.to_vec();
    }
    if samples.is_empty() {
        return Vec::new();
    }

    let step = source_rate as f64 / CANONICAL_SAMPLE_RATE as f64;
    let output_len = (samples.len() as f64 / step).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let pos = i as f64 * step;
            let left = pos as usize;
            let frac = (pos - left as f64) as f32;
            match (samples.get(left), samples.get(left + 1)) {
                (Some(&a), Some(&b)) => a + (b - a) * frac,
                (Some(&a), None) => a,
                _ => 0.0,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
