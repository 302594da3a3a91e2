//! Sequential upload dispatch with a position-based partition split.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::audio::{ClipDecoder, DecodeError, CANONICAL_INTERVAL_MS};
use crate::catalog::ClipReference;
use crate::envelope::{EnvelopeBuilder, SignError};

use super::transport::{IngestTransport, UploadError};

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// Dataset partition an upload is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Training,
    Testing,
}

impl Partition {
    /// Path segment used by the ingestion endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Training => "training",
            Partition::Testing => "testing",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DispatchError
// ---------------------------------------------------------------------------

/// Why one clip's upload failed. Never aborts the run.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of one clip's upload attempt.
#[derive(Debug)]
pub struct UploadOutcome {
    pub reference: ClipReference,
    pub partition: Partition,
    pub success: bool,
}

/// Clips whose upload did not succeed, in scan order.
pub type FailureList = Vec<ClipReference>;

/// Everything the dispatcher observed during a run.
#[derive(Debug, Default)]
pub struct UploadReport {
    /// One outcome per dispatched clip, in scan order.
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadReport {
    /// References of failed uploads, in scan order.
    pub fn failures(&self) -> impl Iterator<Item = &ClipReference> {
        self.outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| &o.reference)
    }

    /// Consume the report into the ordered failure list.
    pub fn into_failures(self) -> FailureList {
        self.outcomes
            .into_iter()
            .filter(|o| !o.success)
            .map(|o| o.reference)
            .collect()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Drives the selected clips through load → sign → upload, one at a time,
/// in scan order.
///
/// The training/testing split is position-based: every clip starts in
/// `Training`, and after processing item `i` of `n` the partition switches
/// to `Testing` once `(i+1)/n ≥ 1 − testing_fraction`. The switch is
/// one-way and a failed upload still counts toward the position index.
pub struct Dispatcher {
    decoder: Arc<dyn ClipDecoder>,
    builder: EnvelopeBuilder,
    transport: Arc<dyn IngestTransport>,
}

impl Dispatcher {
    pub fn new(
        decoder: Arc<dyn ClipDecoder>,
        builder: EnvelopeBuilder,
        transport: Arc<dyn IngestTransport>,
    ) -> Self {
        Self {
            decoder,
            builder,
            transport,
        }
    }

    /// Upload every clip and return the accumulated outcomes.
    ///
    /// Per-item errors (decode, sign, transport) are recorded as failed
    /// outcomes; nothing unwinds past the item boundary.
    pub async fn run(
        &self,
        clips: Vec<ClipReference>,
        label: &str,
        testing_fraction: f64,
    ) -> UploadReport {
        let n = clips.len();
        let mut partition = Partition::Training;
        let mut outcomes = Vec::with_capacity(n);

        for (i, clip) in clips.into_iter().enumerate() {
            let success = match self.process(&clip, partition, label).await {
                Ok(()) => {
                    log::info!(
                        "{}/{n}: uploaded {} ({partition})",
                        i + 1,
                        clip.path.display(),
                    );
                    true
                }
                Err(e) => {
                    log::warn!("{}/{n}: upload of {} failed: {e}", i + 1, clip.path.display());
                    false
                }
            };

            outcomes.push(UploadOutcome {
                reference: clip,
                partition,
                success,
            });

            // One-way switch: the last `testing_fraction` of the selection
            // (by scan position) lands in the testing set.
            if (i + 1) as f64 / n as f64 >= 1.0 - testing_fraction {
                partition = Partition::Testing;
            }
        }

        UploadReport { outcomes }
    }

    async fn process(
        &self,
        clip: &ClipReference,
        partition: Partition,
        label: &str,
    ) -> Result<(), DispatchError> {
        let samples = self.decoder.load(&clip.path)?;
        let signed = self.builder.build(samples, CANONICAL_INTERVAL_MS)?;
        self.transport
            .upload(partition, &clip.file_name(), label, signed.body)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
