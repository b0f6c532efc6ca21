//! Configuration errors.

use std::path::PathBuf;

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Why a directory or subtree could not be adopted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Directory has no descriptor and is not managed
    #[error("no descriptor in {}", dir.display())]
    NoDescriptor {
        /// Directory searched
        dir: PathBuf,
    },

    /// `[main] mode` is missing or not a known mode
    #[error("invalid mode {value:?} in {}", path.display())]
    InvalidMode {
        /// Descriptor file
        path: PathBuf,
        /// Declared value, if any
        value: Option<String>,
    },

    /// A `[settings-*]` section does not say which tier it is for
    #[error("section [{section}] in {} has no tier key", path.display())]
    MissingTierKey {
        /// Descriptor file
        path: PathBuf,
        /// Offending section
        section: String,
    },

    /// A `[settings-*]` section names an unknown tier
    #[error("section [{section}] in {} has unknown tier {value:?}", path.display())]
    InvalidTier {
        /// Descriptor file
        path: PathBuf,
        /// Offending section
        section: String,
        /// Declared value
        value: String,
    },

    /// Descriptor is not well-formed
    #[error("{}:{line}: {message}", path.display())]
    Syntax {
        /// Descriptor file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// A descendant of a container failed to build
    #[error("subtree {} rejected: {source}", path.display())]
    Subtree {
        /// Child directory
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: Box<ConfigError>,
    },

    /// Filesystem error while reading a directory or descriptor
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// The innermost error, looking through subtree wrappers.
    pub fn root_cause(&self) -> &ConfigError {
        match self {
            ConfigError::Subtree { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
