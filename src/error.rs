pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to probe video: {reason}")]
    Probe { reason: String },

    #[error("video has no decodable video stream")]
    NoVideoStream,

    #[error("decode failed after {frames_read} frames: {reason}")]
    Decode { frames_read: usize, reason: String },

    #[error("video contains no frames")]
    EmptyVideo,

    #[error("frame {index} out of range (video has {count} frames)")]
    FrameOutOfRange { index: usize, count: usize },

    #[error("point ({x}, {y}) outside of frame {width}x{height}")]
    PointOutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    #[error("invalid display scale {0}")]
    InvalidScale(f64),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
