//! Core data structures for molecular structure records.
//!
//! - [`value`] – Property kinds, scalar values, and nullable per-row columns.
//! - [`structure`] – The generic structure record exchanged with callers.
//!
//! The model deliberately carries no storage details: null values are
//! plain `None` entries, and the mapping between this representation and
//! the columnar on-disk form lives in [`crate::io::mae`].

pub mod structure;
pub mod value;
