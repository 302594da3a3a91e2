//! Upload path — HTTP transport to the ingestion service and the
//! sequential dispatch state machine.
//!
//! # Architecture
//!
//! ```text
//! Vec<ClipReference>  (catalog order)
//!        │
//!        ▼
//! Dispatcher::run()           ← single async task
//!        │  per clip, index i of n
//!        ├─ ClipDecoder::load        (DecodeError → failed outcome)
//!        ├─ EnvelopeBuilder::build
//!        ├─ IngestTransport::upload  (UploadError → failed outcome)
//!        └─ after item i: (i+1)/n ≥ 1−testing_fraction
//!                         → partition = Testing (one-way)
//!        ▼
//! UploadReport  (all outcomes + ordered failure list)
//! ```

pub mod dispatcher;
pub mod transport;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use dispatcher::{Dispatcher, FailureList, Partition, UploadOutcome, UploadReport};
pub use transport::{HttpTransport, IngestTransport, UploadError};

// test-only re-export so the dispatcher test module can script transport
// failures without reaching into `transport::mock`.
#[cfg(test)]
pub use transport::MockTransport;
