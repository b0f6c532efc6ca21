//! Built-in tools (ffprobe, ffmpeg).

use super::r#trait::*;
use async_trait::async_trait;
use convy_core::{EncodeRequest, Pass};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Lines of stderr kept when an invocation fails.
const STDERR_TAIL_LINES: usize = 20;

/// Probes the first video stream with ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: PathBuf,
}

impl FfprobeProber {
    /// Use `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffprobe"),
        }
    }

    /// Use a specific ffprobe binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<Dimensions, ToolError> {
        let program = self.program.display().to_string();
        let output = Command::new(&self.program)
            .args(["-v", "quiet", "-print_format", "json", "-show_streams", "-select_streams", "v:0"])
            .arg(path)
            .output()
            .await
            .map_err(|source| ToolError::Spawn { program, source })?;

        if !output.status.success() {
            return Err(ToolError::Probe {
                path: path.to_path_buf(),
                message: format!("ffprobe exited with {}", output.status),
            });
        }

        parse_dimensions(&String::from_utf8_lossy(&output.stdout), path)
    }
}

/// Extract the first stream's width and height from ffprobe JSON.
fn parse_dimensions(json: &str, path: &Path) -> Result<Dimensions, ToolError> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| ToolError::Probe {
        path: path.to_path_buf(),
        message: format!("invalid ffprobe JSON: {e}"),
    })?;

    let Some(stream) = value["streams"].as_array().and_then(|s| s.first()) else {
        return Err(ToolError::NoVideoStream {
            path: path.to_path_buf(),
        });
    };

    let dim = |key: &str| {
        stream[key]
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| ToolError::Probe {
                path: path.to_path_buf(),
                message: format!("stream has no {key}"),
            })
    };

    Ok(Dimensions {
        width: dim("width")?,
        height: dim("height")?,
    })
}

/// Runs each pass as one ffmpeg invocation with every rung as an output.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: PathBuf,
    null_sink: String,
}

impl FfmpegEncoder {
    /// Use `ffmpeg` from `PATH`.
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            null_sink: if cfg!(windows) { "NUL" } else { "/dev/null" }.to_string(),
        }
    }

    /// Use a specific ffmpeg binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn encode(&self, request: &EncodeRequest, pass: Pass) -> Result<PassOutput, ToolError> {
        let start = std::time::Instant::now();
        let program = self.program.display().to_string();

        // Pass logs live next to the outputs, so directories are needed on every pass.
        for output in &request.outputs {
            if let Some(dir) = output.target.parent() {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|source| ToolError::Spawn { program: program.clone(), source })?;
            }
        }

        let args = ffmpeg_args(request, pass, &self.null_sink);
        debug!("Running {} pass {}: {:?}", program, pass, args);

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|source| ToolError::Spawn { program: program.clone(), source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let lines: Vec<&str> = stderr.lines().collect();
            let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
            return Err(ToolError::Failed {
                program,
                status: output.status.code(),
                stderr: tail,
                args,
            });
        }

        Ok(PassOutput {
            args,
            duration: start.elapsed(),
        })
    }
}

/// Build the ffmpeg argument list for one pass.
///
/// Every rung becomes one output. Passes before the last write statistics only
/// and send their video to `null_sink`.
pub fn ffmpeg_args(request: &EncodeRequest, pass: Pass, null_sink: &str) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-y", "-i"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    args.push(request.source.display().to_string());

    for output in &request.outputs {
        let settings = &output.settings;

        args.extend(["-map".to_string(), "0:v:0".to_string()]);
        if pass.is_final() {
            args.extend(["-map".to_string(), "0:a?".to_string()]);
        }
        args.extend(["-c:v".to_string(), settings.video_codec().to_string()]);
        if let Some(bitrate) = settings.get(convy_core::keys::VIDEO_BITRATE) {
            args.extend(["-b:v".to_string(), bitrate.to_string()]);
        }
        if let Some(preset) = settings.get(convy_core::keys::VIDEO_PRESET) {
            args.extend(["-preset".to_string(), preset.to_string()]);
        }
        args.extend(["-vf".to_string(), format!("scale=-2:{}", output.tier.height())]);
        if pass.is_multi() {
            args.extend([
                "-pass".to_string(),
                pass.index.to_string(),
                "-passlogfile".to_string(),
                format!("{}.passlog", output.target.display()),
            ]);
        }
        args.extend(settings.params());

        if pass.is_final() {
            args.extend([
                "-c:a".to_string(),
                settings.audio_codec().to_string(),
                "-f".to_string(),
                settings.output_format().to_string(),
                output.target.display().to_string(),
            ]);
        } else {
            args.extend([
                "-an".to_string(),
                "-f".to_string(),
                "null".to_string(),
                null_sink.to_string(),
            ]);
        }
    }

    args
}
