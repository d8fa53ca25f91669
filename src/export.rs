use csv::{ReaderBuilder, Terminator, Trim, WriterBuilder};
use image::ImageFormat;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::frame::FrameBuffer;
use crate::roi::{crop_patch, RoiSquare};
use crate::tracker::Annotation;

pub const CSV_FILE_NAME: &str = "data.csv";

/// One `index,x,y` line of `data.csv`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    pub index: usize,
    pub x: i32,
    pub y: i32,
}

impl From<&Annotation> for CsvRow {
    fn from(annotation: &Annotation) -> Self {
        Self {
            index: annotation.index,
            x: annotation.point.x,
            y: annotation.point.y,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportReport {
    pub csv_path: PathBuf,
    pub patches: Vec<PathBuf>,
}

pub fn patch_file_name(index: usize) -> String {
    format!("{index:05}.png")
}

pub fn write_csv(path: &Path, annotations: &[Annotation]) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)?;
    for annotation in annotations {
        writer.serialize(CsvRow::from(annotation))?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads `index,x,y` rows, e.g. a previously exported `data.csv`.
pub fn read_csv(path: &Path) -> Result<Vec<CsvRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Writes `data.csv` and one cropped patch per annotation into `directory`.
/// `annotations` must be sorted and reference frames that exist.
pub fn export_annotations(
    directory: &Path,
    frames: &[FrameBuffer],
    annotations: &[Annotation],
    config: &TrackerConfig,
) -> Result<ExportReport> {
    let csv_path = directory.join(CSV_FILE_NAME);
    write_csv(&csv_path, annotations)?;

    let mut patches = Vec::with_capacity(annotations.len());
    for annotation in annotations {
        let Some(frame) = frames.get(annotation.index) else {
            continue;
        };
        let square = RoiSquare::centered(annotation.point, config.roi_size);
        let patch = crop_patch(frame, &square);
        let patch_path = directory.join(patch_file_name(annotation.index));
        patch.save_with_format(&patch_path, ImageFormat::Png)?;
        debug!("saved patch {}", patch_path.display());
        patches.push(patch_path);
    }

    Ok(ExportReport { csv_path, patches })
}
