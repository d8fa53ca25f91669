mod args;

use log::debug;
use log::error;
use log::info;
use log::warn;
use roi_annotator::config::TrackerConfig;
use roi_annotator::events::TrackingEvent;
use roi_annotator::{export, logging, FrameStore, Result};

async fn run(args: args::Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => TrackerConfig::from_file(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(roi_size) = args.roi_size {
        config.roi_size = roi_size;
        config.validate()?;
    }

    let mut store = FrameStore::new(config);
    let mut events = store.subscribe();
    let status = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                TrackingEvent::LoadProgress { .. } => debug!("{event}"),
                TrackingEvent::DecodeError { .. } => warn!("{event}"),
                _ => info!("{event}"),
            }
        }
    });

    store.set_video_path(&args.input);
    store.load().await?;
    store.set_scale(args.scale)?;

    if let Some(points_file) = &args.points_file {
        for row in export::read_csv(points_file)? {
            store.annotate_original(row.index, mint::Point2 { x: row.x, y: row.y })?;
        }
    }

    for point in &args.points {
        store.set_current_frame(point.index)?;
        store.annotate(point.x, point.y)?;
    }
    info!(
        "{} of {} frames annotated",
        store.annotations().len(),
        store.total_frame_count()
    );

    if let Some(index) = args.preview {
        store.set_current_frame(index)?;
        if let Some(frame) = store.render_current_frame() {
            frame.save(&args.preview_output)?;
            info!("preview of frame {index} written to {}", args.preview_output.display());
        }
    }

    std::fs::create_dir_all(&args.output)?;
    store.export(&args.output)?;

    drop(store);
    let _ = status.await;
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = args::parse_args();

    if let Err(e) = logging::setup_logging() {
        eprintln!("failed to set up logging: {e}");
    }

    if let Err(e) = run(args).await {
        error!("{e}");
        std::process::exit(1);
    }
}
