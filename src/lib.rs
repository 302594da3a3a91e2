//! Curated audio-clip uploader for a remote ingestion service.
//!
//! The crate selects a duration-bounded, salience-balanced subset of labeled
//! clips from an annotated corpus, wraps each clip's samples in a signed
//! envelope, and streams the envelopes to an ingestion endpoint, splitting
//! the stream into training and testing partitions by scan position.
//!
//! # Pipeline
//!
//! ```text
//! catalog CSV ─▶ catalog::select_clips ─▶ Vec<ClipReference>
//!                                              │
//!                                              ▼
//!                                   upload::Dispatcher::run
//!                                              │  (per clip, in scan order)
//!                     audio::ClipDecoder::load ┤
//!                   envelope::EnvelopeBuilder  ┤
//!                    upload::IngestTransport   ┤
//!                                              ▼
//!                                        UploadReport
//! ```

pub mod audio;
pub mod catalog;
pub mod config;
pub mod envelope;
pub mod upload;
