//! Clip decoding — turns an on-disk audio file into a canonical sample
//! sequence.
//!
//! The rest of the crate only sees the [`ClipDecoder`] trait:
//!
//! * [`ClipDecoder::probe`] — cheap compatibility check used while scanning
//!   the catalog; never errors, a `false` just excludes the clip.
//! * [`ClipDecoder::load`] — full decode to 16 kHz mono `f32`, with the
//!   amplitude rescaled according to the source bit depth.
//!
//! [`WavDecoder`] is the production implementation (WAV PCM via `hound`).
//! [`MockDecoder`] (under `#[cfg(test)]`) is a stub with scriptable probe
//! and load failures, used by the catalog and dispatcher test suites.

use std::path::Path;

use thiserror::Error;

pub mod resample;
pub mod wav;

pub use resample::{downmix_mono, resample_to_canonical};
pub use wav::WavDecoder;

// test-only re-export so other modules' test suites can import MockDecoder
// without reaching into `audio::mock`.
#[cfg(test)]
pub use mock::MockDecoder;

/// Sample rate every [`SampleSequence`] is resampled to, in Hz.
pub const CANONICAL_SAMPLE_RATE: u32 = 16_000;

/// Milliseconds between two consecutive samples at the canonical rate.
pub const CANONICAL_INTERVAL_MS: f64 = 1_000.0 / CANONICAL_SAMPLE_RATE as f64;

/// Mono amplitude values at [`CANONICAL_SAMPLE_RATE`].
pub type SampleSequence = Vec<f32>;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Errors raised while decoding a selected clip.
///
/// These are per-item failures: the dispatcher records them and moves on to
/// the next clip, it never aborts the run.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file could not be opened or its header is not a valid container.
    #[error("failed to open {path}: {reason}")]
    Open { path: String, reason: String },

    /// The header was readable but the sample data is truncated or corrupt.
    #[error("corrupt sample data in {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

// ---------------------------------------------------------------------------
// ClipDecoder trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for clip decoding.
///
/// Implementations must be `Send + Sync` so they can be held behind an
/// `Arc<dyn ClipDecoder>` and shared between the scanner and the dispatcher.
pub trait ClipDecoder: Send + Sync {
    /// Return `true` when the file at `path` looks decodable.
    ///
    /// Must be cheap (header-only) and must never panic or error — an
    /// unreadable file is simply incompatible.
    fn probe(&self, path: &Path) -> bool;

    /// Decode the file at `path` into a canonical sample sequence.
    fn load(&self, path: &Path) -> Result<SampleSequence, DecodeError>;
}

// Compile-time assertion: Box<dyn ClipDecoder> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn ClipDecoder>) {}
};

// ---------------------------------------------------------------------------
// MockDecoder (test double)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod mock {
    use std::path::{Path, PathBuf};

    use super::{ClipDecoder, DecodeError, SampleSequence};

    /// Scriptable [`ClipDecoder`] stub.
    ///
    /// Probe and load failures are keyed by path suffix (`Path::ends_with`)
    /// so tests can name clips without caring about the audio root.
    pub struct MockDecoder {
        samples: SampleSequence,
        probe_failures: Vec<PathBuf>,
        load_failures: Vec<PathBuf>,
    }

    impl MockDecoder {
        /// A decoder that accepts every probe and returns `samples` from
        /// every load.
        pub fn ok(samples: SampleSequence) -> Self {
            Self {
                samples,
                probe_failures: Vec::new(),
                load_failures: Vec::new(),
            }
        }

        /// Make `probe` return `false` for paths ending in `suffix`.
        pub fn with_probe_failure(mut self, suffix: impl Into<PathBuf>) -> Self {
            self.probe_failures.push(suffix.into());
            self
        }

        /// Make `load` fail for paths ending in `suffix`.
        pub fn with_load_failure(mut self, suffix: impl Into<PathBuf>) -> Self {
            self.load_failures.push(suffix.into());
            self
        }
    }

    impl ClipDecoder for MockDecoder {
        fn probe(&self, path: &Path) -> bool {
            !self.probe_failures.iter().any(|s| path.ends_with(s))
        }

        fn load(&self, path: &Path) -> Result<SampleSequence, DecodeError> {
            if self.load_failures.iter().any(|s| path.ends_with(s)) {
                return Err(DecodeError::Corrupt {
                    path: path.display().to_string(),
                    reason: "scripted failure".into(),
                });
            }
            Ok(self.samples.clone())
        }
    }
}
