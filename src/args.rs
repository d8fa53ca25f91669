use clap::Parser;
use std::path::PathBuf;

/// Annotation given on the command line, in display coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointArg {
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

fn parse_point(arg: &str) -> Result<PointArg, String> {
    let parts: Vec<&str> = arg.split(':').map(str::trim).collect();
    let [index, x, y] = parts[..] else {
        return Err(format!("point '{arg}' should be formatted as index:x:y"));
    };
    Ok(PointArg {
        index: index
            .parse()
            .map_err(|_| format!("invalid frame index '{index}'"))?,
        x: x.parse().map_err(|_| format!("invalid x coordinate '{x}'"))?,
        y: y.parse().map_err(|_| format!("invalid y coordinate '{y}'"))?,
    })
}

#[derive(Clone, Parser)]
#[clap(
    name = "roi-annotator",
    about = "Annotate one ROI point per video frame and export cropped patches",
    version,
    author
)]
pub struct Args {
    /// Path to Video File
    #[clap(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Export directory, created if missing
    #[clap(short = 'o', long = "output")]
    pub output: PathBuf,

    /// ROI point as index:x:y in display coordinates (repeatable)
    #[clap(short = 'p', long = "point", value_parser = parse_point)]
    pub points: Vec<PointArg>,

    /// CSV file with index,x,y rows in video pixels, e.g. a previously
    /// exported data.csv. `--scale` does not apply to these rows
    #[clap(long = "points")]
    pub points_file: Option<PathBuf>,

    /// Display scale (display size / video size) of the given points
    #[clap(short = 's', long = "scale", default_value = "1.0")]
    pub scale: f64,

    /// Side length of the ROI square
    #[clap(short = 'r', long = "roi-size")]
    pub roi_size: Option<u32>,

    /// Tracker configuration (json)
    #[clap(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Render the given frame with its ROI
    #[clap(long = "preview")]
    pub preview: Option<usize>,

    #[clap(long = "preview-output", default_value = "preview.png")]
    pub preview_output: PathBuf,
}

pub fn parse_args() -> Args {
    Args::parse()
}
