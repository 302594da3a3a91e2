//! Catalog scanning — reads the corpus metadata and selects a
//! duration-bounded subset of clip references.
//!
//! # Flow
//!
//! ```text
//! metadata CSV ─▶ read_catalog ─▶ Vec<CatalogRow>
//!                                      │
//!                                      ▼
//!                               select_clips ─▶ Vec<ClipReference>
//!                              (label filter, probe filter,
//!                               foreground + total duration budgets)
//! ```
//!
//! The selection preserves catalog order; the upload dispatcher derives the
//! training/testing split point from that order.

pub mod scanner;

pub use scanner::{
    read_catalog, select_clips, CatalogError, CatalogRow, ClipReference, Salience,
};
