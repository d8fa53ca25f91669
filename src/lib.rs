pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod ffmpeg_stream;
pub mod frame;
pub mod logging;
pub mod roi;
pub mod source;
pub mod tracker;

pub use error::{Error, Result};
pub use tracker::{Annotation, FrameStore};
