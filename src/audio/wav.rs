//! WAV PCM implementation of [`ClipDecoder`] on top of `hound`.
//!
//! Decoding is three steps: read normalized `[-1, 1]` samples, downmix and
//! resample to the canonical rate, then rescale the amplitude to the source
//! full-scale range. The rescale rule matches the ingestion service's
//! expectations: 8-bit material (stored unsigned in WAV) maps to the
//! unsigned full scale `2^bits`, everything else to the signed full scale
//! `2^(bits-1)`.

use std::path::Path;

use super::resample::{downmix_mono, resample_to_canonical};
use super::{ClipDecoder, DecodeError, SampleSequence};

/// WAV PCM decoder. Stateless; construct once and share.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavDecoder;

impl WavDecoder {
    pub fn new() -> Self {
        Self
    }
}

/// Full-scale factor applied after resampling.
fn amplitude_scale(bits_per_sample: u16) -> f32 {
    if bits_per_sample == 8 {
        (1u32 << bits_per_sample) as f32
    } else {
        (1u64 << (bits_per_sample - 1)) as f32
    }
}

impl ClipDecoder for WavDecoder {
    /// A clip is compatible when its WAV header parses.
    fn probe(&self, path: &Path) -> bool {
        hound::WavReader::open(path).is_ok()
    }

    fn load(&self, path: &Path) -> Result<SampleSequence, DecodeError> {
        let mut reader = hound::WavReader::open(path).map_err(|e| DecodeError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let spec = reader.spec();

        let corrupt = |e: hound::Error| DecodeError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        // Normalize to [-1, 1] regardless of the stored sample type.
        let normalized: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(corrupt)?,
            hound::SampleFormat::Int => {
                let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / full_scale))
                    .collect::<Result<_, _>>()
                    .map_err(corrupt)?
            }
        };

        let mono = downmix_mono(&normalized, spec.channels);
        let canonical = resample_to_canonical(&mono, spec.sample_rate);

        let scale = amplitude_scale(spec.bits_per_sample);
        Ok(canonical.into_iter().map(|s| s * scale).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
