//! Per-directory configuration.
//!
//! Parses `convy.cfg` descriptors, builds the validated [`ConfigTree`] for a
//! managed root and resolves layered settings from it.
//!
//! [`ConfigTree`]: convy_core::ConfigTree

#![warn(missing_docs)]

pub mod error;
pub mod descriptor;
pub mod builder;
pub mod resolver;

pub use error::{ConfigError, Result};
pub use descriptor::{Descriptor, DESCRIPTOR_FILE};
pub use builder::TreeBuilder;
pub use resolver::{inherit_notify_context, SettingsResolver};
