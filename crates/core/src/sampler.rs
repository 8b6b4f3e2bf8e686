//! Evenly spaced frame sampling.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use tokio::{fs, process::Command};
use tracing::debug;

use crate::{
    error::{Result, VidseoError},
    format::format_timestamp,
    types::{SampledFrame, VideoInfo},
};

/// Media backend able to probe a video and grab single frames from it.
///
/// Futures are not required to be `Send`; sampling runs on the caller's task.
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    async fn probe(&self, video: &Path) -> Result<VideoInfo>;

    /// Write the frame displayed at `timestamp` to `output` as a JPEG.
    async fn capture(&self, video: &Path, timestamp: f64, quality: f32, output: &Path)
    -> Result<()>;
}

/// Timestamps `duration * i / count` for `i` in `0..count`.
pub fn sample_timestamps(duration: f64, count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| duration * i as f64 / count as f64)
        .collect()
}

/// Map a JPEG quality in (0, 1] to ffmpeg's MJPEG `-q:v` scale, where 2 is best and 31 worst.
pub fn jpeg_qscale(quality: f32) -> u8 {
    let quality = if quality.is_finite() {
        quality.clamp(0.0, 1.0)
    } else {
        1.0
    };
    (2.0 + (1.0 - quality) * 29.0).round() as u8
}

/// Sample `count` frames from `video`, in timestamp order.
///
/// Captures run one at a time. Intermediate files live in a temporary
/// directory that is removed when this returns, on success or failure.
pub async fn sample_frames<S: FrameSource>(
    source: &S,
    video: &Path,
    count: usize,
    quality: f32,
) -> Result<Vec<SampledFrame>> {
    if count == 0 {
        return Err(VidseoError::decode(video, "frame count must be at least 1"));
    }

    let info = source.probe(video).await?;
    if !info.duration.is_finite() || info.duration <= 0.0 {
        return Err(VidseoError::decode(
            video,
            format!("video has no playable duration ({})", info.duration),
        ));
    }
    debug!(
        duration = info.duration,
        width = info.width,
        height = info.height,
        count,
        "sampling frames"
    );

    let work_dir = tempfile::Builder::new()
        .prefix("vidseo-frames-")
        .tempdir()
        .map_err(|e| VidseoError::decode(video, format!("failed to create work dir: {e}")))?;

    let mut frames = Vec::with_capacity(count);
    for (index, timestamp) in sample_timestamps(info.duration, count).into_iter().enumerate() {
        let output = work_dir.path().join(format!("frame_{index:03}.jpg"));
        source.capture(video, timestamp, quality, &output).await?;

        let bytes = fs::read(&output).await.map_err(|e| {
            VidseoError::decode(video, format!("frame {index} was not written: {e}"))
        })?;
        if bytes.is_empty() {
            return Err(VidseoError::decode(
                video,
                format!("frame {index} at {} is empty", format_timestamp(timestamp)),
            ));
        }
        debug!(index, timestamp, bytes = bytes.len(), "captured frame");

        frames.push(SampledFrame {
            index,
            timestamp,
            data: STANDARD.encode(&bytes),
        });
    }

    Ok(frames)
}

/// [`FrameSource`] backed by the `ffprobe` and `ffmpeg` executables.
#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegFrameSource {
    /// Locate ffmpeg and ffprobe on PATH
    pub fn new() -> Result<Self> {
        let ffmpeg =
            which::which("ffmpeg").map_err(|_| VidseoError::MissingTool { tool: "ffmpeg" })?;
        let ffprobe =
            which::which("ffprobe").map_err(|_| VidseoError::MissingTool { tool: "ffprobe" })?;
        Ok(Self { ffmpeg, ffprobe })
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

fn parse_probe(video: &Path, stdout: &[u8]) -> Result<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)
        .map_err(|e| VidseoError::decode(video, format!("unreadable ffprobe output: {e}")))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| VidseoError::decode(video, "no video stream found"))?;

    // Video stream duration first: a longer audio track stretches the container
    // duration past the last picture.
    let parse = |d: Option<&str>| d.and_then(|d| d.parse::<f64>().ok()).filter(|d| *d > 0.0);
    let duration = parse(stream.duration.as_deref())
        .or_else(|| parse(probe.format.as_ref().and_then(|f| f.duration.as_deref())))
        .unwrap_or(0.0);

    Ok(VideoInfo {
        duration,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
    })
}

fn capture_args(video: &Path, timestamp: f64, quality: f32, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-y", "-ss"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(format!("{timestamp:.3}").into());
    args.push("-i".into());
    args.push(video.into());
    args.extend(["-frames:v", "1", "-an", "-q:v"].map(OsString::from));
    args.push(jpeg_qscale(quality).to_string().into());
    args.push(output.into());
    args
}

impl FrameSource for FfmpegFrameSource {
    async fn probe(&self, video: &Path) -> Result<VideoInfo> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(video)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| VidseoError::decode(video, format!("failed to run ffprobe: {e}")))?;

        if !output.status.success() {
            return Err(VidseoError::decode(
                video,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_probe(video, &output.stdout)
    }

    async fn capture(
        &self,
        video: &Path,
        timestamp: f64,
        quality: f32,
        output: &Path,
    ) -> Result<()> {
        let result = Command::new(&self.ffmpeg)
            .args(capture_args(video, timestamp, quality, output))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| VidseoError::decode(video, format!("failed to run ffmpeg: {e}")))?;

        if !result.status.success() {
            return Err(VidseoError::decode(
                video,
                format!(
                    "capture at {} failed: {}",
                    format_timestamp(timestamp),
                    String::from_utf8_lossy(&result.stderr).trim()
                ),
            ));
        }

        Ok(())
    }
}
