use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::frame::{Dimensions, FrameBuffer, VideoInfo};

/// Sequential producer of decoded frames.
///
/// `next_frame` yields `Ok(None)` at the end of the stream and `Err` when
/// decoding fails part way through.
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    fn info(&self) -> &VideoInfo;

    /// Human readable name used in progress messages.
    fn name(&self) -> &str;

    async fn next_frame(&mut self) -> Result<Option<FrameBuffer>>;
}

/// Frames that are already in memory, e.g. synthetic test videos.
pub struct MemorySource {
    name: String,
    info: VideoInfo,
    frames: VecDeque<FrameBuffer>,
}

impl MemorySource {
    pub fn new(name: &str, fps: f32, frames: Vec<FrameBuffer>) -> Result<Self> {
        let Some(first) = frames.first() else {
            return Err(Error::EmptyVideo);
        };
        let dimensions = Dimensions::new(first.width(), first.height());
        if frames
            .iter()
            .any(|f| f.width() != dimensions.width || f.height() != dimensions.height)
        {
            return Err(Error::Probe {
                reason: format!("{name}: frames differ in size"),
            });
        }

        Ok(Self {
            name: name.to_string(),
            info: VideoInfo {
                dimensions,
                fps,
                reported_frames: Some(frames.len() as u64),
            },
            frames: frames.into(),
        })
    }

    /// Override the frame count the source claims to have.
    pub fn with_reported_frames(mut self, reported_frames: Option<u64>) -> Self {
        self.info.reported_frames = reported_frames;
        self
    }
}

impl FrameSource for MemorySource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        Ok(self.frames.pop_front())
    }
}
