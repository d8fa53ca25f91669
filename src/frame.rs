use image::ImageBuffer;
use image::Rgb;

pub type Pixel = Rgb<u8>;

/// Decoded video frame, interleaved RGB8 with a row stride of `3 * width`.
pub type FrameBuffer = ImageBuffer<Pixel, Vec<u8>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size in bytes of one rgb24 frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Scale factor (display / original) of a keep-aspect-ratio fit into
    /// `viewport`. The fitted size is computed with integer truncation, so
    /// the factor is derived from the fitted height like a preview widget
    /// would report it.
    pub fn fit_scale(&self, viewport: Dimensions) -> Option<f64> {
        if self.width == 0 || self.height == 0 || viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let (w, h) = (self.width as u64, self.height as u64);
        let fitted_width = viewport.height as u64 * w / h;
        let fitted_height = if fitted_width <= viewport.width as u64 {
            viewport.height as u64
        } else {
            viewport.width as u64 * h / w
        };
        Some(fitted_height as f64 / h as f64)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    pub dimensions: Dimensions,
    pub fps: f32,
    /// Frame count reported by the container. Only used for progress.
    pub reported_frames: Option<u64>,
}

impl VideoInfo {
    pub fn progress_percent(&self, decoded: usize) -> Option<f32> {
        match self.reported_frames {
            Some(total) if total > 0 => Some(decoded as f32 / total as f32 * 100.0),
            _ => None,
        }
    }
}
