//! Marker storage for Convy.
//!
//! This crate provides a trait-based interface over completion markers with a
//! filesystem reference implementation that writes JSON diagnostics.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;

pub use trait_::{marker_path, MarkerStore, StorageError, Result};
pub use json_storage::JsonMarkerStore;
