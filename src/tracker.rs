use log::debug;
use log::info;
use log::warn;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use crate::events::{EventSink, TrackingEvent};
use crate::export::{self, ExportReport};
use crate::ffmpeg_stream::FFmpegSource;
use crate::frame::{FrameBuffer, VideoInfo};
use crate::roi::{draw_outline, RoiSquare};
use crate::source::FrameSource;

/// Annotated point of one frame, in original video pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub index: usize,
    pub point: mint::Point2<i32>,
}

struct LoadedVideo {
    info: VideoInfo,
    frames: Vec<FrameBuffer>,
    annotations: BTreeMap<usize, mint::Point2<i32>>,
    current: usize,
}

impl LoadedVideo {
    fn annotations(&self) -> Vec<Annotation> {
        self.annotations
            .iter()
            .map(|(&index, &point)| Annotation { index, point })
            .collect()
    }
}

#[derive(Default)]
enum State {
    #[default]
    Unloaded,
    Loading,
    Loaded(LoadedVideo),
    Saving(LoadedVideo),
}

/// In-memory copy of a decoded video plus one optional ROI point per frame.
///
/// Every operation except loading is a silent no-op until a video has been
/// loaded. The store does no locking of its own; callers that load on a
/// worker must not touch it until `load` returns.
pub struct FrameStore {
    state: State,
    video_path: Option<PathBuf>,
    scale: f64,
    config: TrackerConfig,
    events: EventSink,
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl FrameStore {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            state: State::Unloaded,
            video_path: None,
            scale: 1.0,
            config,
            events: EventSink::default(),
        }
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<TrackingEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn set_video_path<P: AsRef<Path>>(&mut self, path: P) {
        self.video_path = Some(path.as_ref().to_path_buf());
    }

    pub fn video_path(&self) -> Option<&Path> {
        self.video_path.as_deref()
    }

    /// Decodes the video at the configured path with ffmpeg. Does nothing if
    /// no path has been set.
    pub async fn load(&mut self) -> Result<()> {
        let Some(path) = self.video_path.clone() else {
            debug!("load requested without a video path");
            return Ok(());
        };

        self.state = State::Loading;
        match FFmpegSource::open(&path).await {
            Ok(source) => self.load_from(source).await,
            Err(e) => {
                self.state = State::Unloaded;
                Err(e)
            }
        }
    }

    /// Replaces all frames and annotations with the content of `source`.
    ///
    /// A decode error after the first frame keeps what has been read so far
    /// and is reported as [`TrackingEvent::DecodeError`].
    pub async fn load_from<S: FrameSource>(&mut self, mut source: S) -> Result<()> {
        self.state = State::Loading;

        let info = source.info().clone();
        let name = source.name().to_string();
        info!("reading {name}");

        let mut frames = Vec::new();
        let mut decode_error = None;
        loop {
            match source.next_frame().await {
                Ok(Some(frame)) => {
                    frames.push(frame);
                    self.events.emit(TrackingEvent::LoadProgress {
                        source: name.clone(),
                        decoded: frames.len(),
                        percent: info.progress_percent(frames.len()),
                    });
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("decoding {name} stopped after {} frames: {e}", frames.len());
                    self.events.emit(TrackingEvent::DecodeError {
                        frames_read: frames.len(),
                        reason: e.to_string(),
                    });
                    decode_error = Some(e);
                    break;
                }
            }
        }

        if frames.is_empty() {
            self.state = State::Unloaded;
            return Err(decode_error.unwrap_or(Error::EmptyVideo));
        }

        let count = frames.len();
        info!(
            "loaded {count} frames of {name} ({}x{} @ {} fps)",
            info.dimensions.width, info.dimensions.height, info.fps
        );
        self.state = State::Loaded(LoadedVideo {
            info,
            frames,
            annotations: BTreeMap::new(),
            current: 0,
        });
        self.events.emit(TrackingEvent::Loaded { frames: count });
        Ok(())
    }

    fn video(&self) -> Option<&LoadedVideo> {
        match &self.state {
            State::Loaded(video) | State::Saving(video) => Some(video),
            _ => None,
        }
    }

    fn video_mut(&mut self) -> Option<&mut LoadedVideo> {
        match &mut self.state {
            State::Loaded(video) => Some(video),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.video().is_some()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, State::Loading)
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.state, State::Saving(_))
    }

    pub fn video_info(&self) -> Option<&VideoInfo> {
        self.video().map(|video| &video.info)
    }

    pub fn total_frame_count(&self) -> usize {
        self.video().map_or(0, |video| video.frames.len())
    }

    pub fn current_frame(&self) -> Option<usize> {
        self.video().map(|video| video.current)
    }

    pub fn set_current_frame(&mut self, index: usize) -> Result<()> {
        let Some(video) = self.video_mut() else {
            return Ok(());
        };
        if index >= video.frames.len() {
            return Err(Error::FrameOutOfRange {
                index,
                count: video.frames.len(),
            });
        }
        video.current = index;
        Ok(())
    }

    pub fn next_frame(&mut self) -> Option<usize> {
        let video = self.video_mut()?;
        video.current = (video.current + 1).min(video.frames.len() - 1);
        Some(video.current)
    }

    pub fn previous_frame(&mut self) -> Option<usize> {
        let video = self.video_mut()?;
        video.current = video.current.saturating_sub(1);
        Some(video.current)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Sets the display scale (`display size / original size`) used to map
    /// annotation coordinates back to original pixels.
    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidScale(scale));
        }
        self.scale = scale;
        Ok(())
    }

    /// Stores the point under the display position `(display_x, display_y)`
    /// for the current frame, replacing any earlier point of that frame.
    pub fn annotate(&mut self, display_x: f64, display_y: f64) -> Result<Option<Annotation>> {
        let scale = self.scale;
        let Some(index) = self.current_frame() else {
            return Ok(None);
        };

        let x = (display_x / scale).round_ties_even();
        let y = (display_y / scale).round_ties_even();
        if !x.is_finite() || !y.is_finite() {
            let dims = self.video().map(|video| video.info.dimensions);
            return Err(Error::PointOutOfBounds {
                x: x as i64,
                y: y as i64,
                width: dims.map_or(0, |d| d.width),
                height: dims.map_or(0, |d| d.height),
            });
        }
        self.insert_point(index, x as i64, y as i64)
    }

    /// Stores a point already given in original video pixels for frame
    /// `index`, e.g. a row of a previously exported `data.csv`. The scale
    /// and the current frame are left untouched.
    pub fn annotate_original(
        &mut self,
        index: usize,
        point: mint::Point2<i32>,
    ) -> Result<Option<Annotation>> {
        let Some(video) = self.video() else {
            return Ok(None);
        };
        if index >= video.frames.len() {
            return Err(Error::FrameOutOfRange {
                index,
                count: video.frames.len(),
            });
        }
        self.insert_point(index, point.x as i64, point.y as i64)
    }

    fn insert_point(&mut self, index: usize, x: i64, y: i64) -> Result<Option<Annotation>> {
        let Some(video) = self.video_mut() else {
            return Ok(None);
        };

        let dims = video.info.dimensions;
        if !dims.contains(x, y) {
            return Err(Error::PointOutOfBounds {
                x,
                y,
                width: dims.width,
                height: dims.height,
            });
        }

        let annotation = Annotation {
            index,
            point: mint::Point2 {
                x: x as i32,
                y: y as i32,
            },
        };
        video.annotations.insert(annotation.index, annotation.point);
        debug!(
            "frame {}: roi at ({}, {})",
            annotation.index, annotation.point.x, annotation.point.y
        );
        self.events.emit(TrackingEvent::RoiUpdated);
        Ok(Some(annotation))
    }

    /// All annotations in ascending frame order.
    pub fn annotations(&self) -> Vec<Annotation> {
        self.video()
            .map(LoadedVideo::annotations)
            .unwrap_or_default()
    }

    pub fn annotation(&self, index: usize) -> Option<Annotation> {
        let point = *self.video()?.annotations.get(&index)?;
        Some(Annotation { index, point })
    }

    /// Copy of the current frame with the ROI square drawn on it.
    pub fn render_current_frame(&self) -> Option<FrameBuffer> {
        let video = self.video()?;
        let mut frame = video.frames.get(video.current)?.clone();
        if let Some(point) = video.annotations.get(&video.current) {
            let square = RoiSquare::centered(*point, self.config.roi_size);
            draw_outline(
                &mut frame,
                &square,
                self.config.outline_pixel(),
                self.config.outline_thickness,
            );
        }
        Some(frame)
    }

    /// Writes `data.csv` and one PNG patch per annotated frame into
    /// `directory`, which must already exist.
    pub fn export(&mut self, directory: &Path) -> Result<Option<ExportReport>> {
        let video = match std::mem::take(&mut self.state) {
            State::Loaded(video) => video,
            other => {
                self.state = other;
                return Ok(None);
            }
        };
        self.state = State::Saving(video);

        self.events.emit(TrackingEvent::Saving {
            directory: directory.to_path_buf(),
        });
        info!("saving roi points to {}", directory.display());

        let mut result = Ok(None);
        if let State::Saving(video) = &self.state {
            result = export::export_annotations(
                directory,
                &video.frames,
                &video.annotations(),
                &self.config,
            )
            .map(Some);
        }

        if let State::Saving(video) = std::mem::take(&mut self.state) {
            self.state = State::Loaded(video);
        }

        let Some(report) = result? else {
            return Ok(None);
        };
        self.events.emit(TrackingEvent::Saved {
            directory: directory.to_path_buf(),
            points: report.patches.len(),
        });
        info!("saved {} roi points", report.patches.len());
        Ok(Some(report))
    }
}
