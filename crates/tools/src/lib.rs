//! External media tools.
//!
//! Probe source dimensions with ffprobe and run multi-output encodes with
//! ffmpeg, behind traits the scheduler can swap out.

#![warn(missing_docs)]

pub mod r#trait;
pub mod builtin;

pub use r#trait::{Dimensions, Encoder, PassOutput, Prober, ToolError};
pub use builtin::{ffmpeg_args, FfmpegEncoder, FfprobeProber};
