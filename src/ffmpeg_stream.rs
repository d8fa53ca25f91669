use bytes::BytesMut;
use fraction::ToPrimitive;
use futures_util::StreamExt;
use log::debug;
use log::info;
use log::warn;
use serde::Deserialize;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio_util::codec::Decoder;
use tokio_util::codec::FramedRead;

use crate::error::{Error, Result};
use crate::frame::{Dimensions, FrameBuffer, VideoInfo};
use crate::source::FrameSource;

const DEFAULT_FPS: f32 = 30.0;

/// Splits an rgb24 rawvideo byte stream into whole frames.
pub struct VideoFrame {
    capacity: usize,
}

impl VideoFrame {
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            capacity: dimensions.frame_len(),
        }
    }
}

impl Decoder for VideoFrame {
    type Error = io::Error;
    type Item = BytesMut;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        if src.capacity() < self.capacity {
            src.reserve(self.capacity)
        }
        if self.capacity > 0 && src.len() >= self.capacity {
            Ok(Some(src.split_to(self.capacity)))
        } else {
            Ok(None)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    /// e.g. "30/1" or "30000/1001"
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

pub fn parse_frame_rate(rate: &str) -> Option<f32> {
    let (numerator, denominator) = match rate.trim().split_once('/') {
        Some((numerator, denominator)) => (numerator.trim(), denominator.trim()),
        None => (rate.trim(), "1"),
    };
    let numerator = numerator.parse::<u64>().ok()?;
    let denominator = denominator.parse::<u64>().ok()?;
    if denominator == 0 {
        return None;
    }
    let fps = fraction::Fraction::new(numerator, denominator).to_f32()?;
    if fps.is_finite() && fps > 0.0 {
        Some(fps)
    } else {
        None
    }
}

/// Turns `ffprobe -print_format json -show_streams -show_format` output for
/// the first video stream into a [`VideoInfo`].
pub fn parse_probe_output(json: &str) -> Result<VideoInfo> {
    let output: ProbeOutput = serde_json::from_str(json).map_err(|e| Error::Probe {
        reason: format!("unexpected ffprobe output: {e}"),
    })?;

    let Some((stream, width, height)) = output
        .streams
        .iter()
        .find_map(|s| match (s.width, s.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((s, w, h)),
            _ => None,
        })
    else {
        return Err(Error::NoVideoStream);
    };

    let fps = match stream.r_frame_rate.as_deref().and_then(parse_frame_rate) {
        Some(fps) => fps,
        None => {
            warn!("could not determine fps of video, assuming {DEFAULT_FPS}");
            DEFAULT_FPS
        }
    };

    let duration = stream
        .duration
        .as_deref()
        .or(output.format.as_ref().and_then(|f| f.duration.as_deref()))
        .and_then(|d| d.trim().parse::<f64>().ok());
    let reported_frames = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .or_else(|| duration.map(|d| (d * fps as f64).round() as u64));

    Ok(VideoInfo {
        dimensions: Dimensions::new(width, height),
        fps,
        reported_frames,
    })
}

pub async fn probe_video(video_path: &Path) -> Result<VideoInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(video_path)
        .output()
        .await
        .map_err(|e| Error::Probe {
            reason: format!("could not run ffprobe: {e}"),
        })?;

    if !output.status.success() {
        return Err(Error::Probe {
            reason: format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

/// Decodes a video file by piping rgb24 rawvideo out of an `ffmpeg` child
/// process. The child is killed when the source is dropped.
pub struct FFmpegSource {
    name: String,
    info: VideoInfo,
    child: Child,
    reader: FramedRead<ChildStdout, VideoFrame>,
    stderr: Option<JoinHandle<String>>,
    frames_read: usize,
}

impl FFmpegSource {
    pub async fn open(video_path: &Path) -> Result<Self> {
        if !video_path.exists() {
            return Err(Error::Probe {
                reason: format!("video file not found: {}", video_path.display()),
            });
        }

        let info = probe_video(video_path).await?;
        debug!(
            "probed {}: {}x{} @ {} fps, {:?} frames",
            video_path.display(),
            info.dimensions.width,
            info.dimensions.height,
            info.fps,
            info.reported_frames
        );

        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-hide_banner", "-loglevel", "error", "-noautorotate", "-i"]);
        cmd.arg(video_path);
        cmd.args([
            "-f",
            "image2pipe",
            "-pix_fmt",
            "rgb24",
            "-vcodec",
            "rawvideo",
            "-an",
            "-sn",
            "-",
        ]);

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| Error::Probe {
            reason: format!("could not run ffmpeg: {e}"),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| Error::Probe {
            reason: "ffmpeg process did not have a handle to stdout".to_string(),
        })?;

        let stderr = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut text = String::new();
                let _ = stderr.read_to_string(&mut text).await;
                text
            })
        });

        info!("start ffmpeg for {}", video_path.display());

        Ok(Self {
            name: video_path.display().to_string(),
            reader: FramedRead::new(stdout, VideoFrame::new(info.dimensions)),
            info,
            child,
            stderr,
            frames_read: 0,
        })
    }

    async fn stderr_text(&mut self) -> String {
        match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default().trim().to_string(),
            None => String::new(),
        }
    }
}

impl FrameSource for FFmpegSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        let dimensions = self.info.dimensions;
        match self.reader.next().await {
            Some(Ok(bytes_mut_buffer)) => {
                let frame = FrameBuffer::from_raw(
                    dimensions.width,
                    dimensions.height,
                    bytes_mut_buffer.to_vec(),
                )
                .ok_or_else(|| Error::Decode {
                    frames_read: self.frames_read,
                    reason: "frame buffer has unexpected size".to_string(),
                })?;
                self.frames_read += 1;
                Ok(Some(frame))
            }
            Some(Err(e)) => {
                let stderr = self.stderr_text().await;
                Err(Error::Decode {
                    frames_read: self.frames_read,
                    reason: if stderr.is_empty() {
                        e.to_string()
                    } else {
                        format!("{e}: {stderr}")
                    },
                })
            }
            None => {
                let status = self.child.wait().await?;
                info!("stop ffmpeg after {} frames", self.frames_read);
                if status.success() {
                    Ok(None)
                } else {
                    let stderr = self.stderr_text().await;
                    Err(Error::Decode {
                        frames_read: self.frames_read,
                        reason: format!("ffmpeg exited with {status}: {stderr}"),
                    })
                }
            }
        }
    }
}
