//! Tool abstractions.

use async_trait::async_trait;
use convy_core::{EncodeRequest, Pass};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from external tools.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The program could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program name
        program: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The source has no video stream
    #[error("no video stream in {}", path.display())]
    NoVideoStream {
        /// Probed file
        path: PathBuf,
    },

    /// The prober's output could not be understood
    #[error("cannot probe {}: {message}", path.display())]
    Probe {
        /// Probed file
        path: PathBuf,
        /// What went wrong
        message: String,
    },

    /// The program ran and reported failure
    #[error("{program} exited with {}: {stderr}", exit_label(.status))]
    Failed {
        /// Program name
        program: String,
        /// Exit code, `None` when killed by a signal
        status: Option<i32>,
        /// Tail of standard error
        stderr: String,
        /// Arguments used
        args: Vec<String>,
    },
}

fn exit_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

impl ToolError {
    /// Arguments of the failed invocation, when known.
    pub fn args(&self) -> &[String] {
        match self {
            ToolError::Failed { args, .. } => args,
            _ => &[],
        }
    }
}

/// Frame size of a source's first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,
}

/// Reports a source's video dimensions.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `path`.
    async fn probe(&self, path: &Path) -> Result<Dimensions, ToolError>;
}

/// Result of one successful encoder invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassOutput {
    /// Arguments passed to the encoder
    pub args: Vec<String>,

    /// Execution duration
    pub duration: std::time::Duration,
}

/// Runs one pass of a multi-output encode. Blocks the caller until done.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Encoder name for logs.
    fn name(&self) -> &str;

    /// Run `pass` of `request`.
    async fn encode(&self, request: &EncodeRequest, pass: Pass) -> Result<PassOutput, ToolError>;
}
