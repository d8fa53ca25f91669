use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Status notifications pushed while loading, annotating and exporting.
#[derive(Clone, Debug, PartialEq)]
pub enum TrackingEvent {
    LoadProgress {
        source: String,
        decoded: usize,
        /// Percentage of the reported frame count, when one is known.
        percent: Option<f32>,
    },
    DecodeError {
        frames_read: usize,
        reason: String,
    },
    Loaded {
        frames: usize,
    },
    RoiUpdated,
    Saving {
        directory: PathBuf,
    },
    Saved {
        directory: PathBuf,
        points: usize,
    },
}

impl fmt::Display for TrackingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingEvent::LoadProgress {
                source,
                percent: Some(percent),
                ..
            } => write!(f, "Reading {source}, progress: {percent:.2}%"),
            TrackingEvent::LoadProgress {
                source, decoded, ..
            } => write!(f, "Reading {source}, {decoded} frames"),
            TrackingEvent::DecodeError {
                frames_read,
                reason,
            } => write!(f, "Decoding stopped after {frames_read} frames: {reason}"),
            TrackingEvent::Loaded { frames } => write!(f, "Video loaded ({frames} frames)"),
            TrackingEvent::RoiUpdated => write!(f, "ROI updated"),
            TrackingEvent::Saving { .. } => write!(f, "Saving file"),
            TrackingEvent::Saved { points, .. } => {
                write!(f, "Save complete, {points} roi points saved")
            }
        }
    }
}

/// Fan-out point for [`TrackingEvent`]s. Sending never fails; events for a
/// dropped receiver are discarded.
#[derive(Default)]
pub struct EventSink {
    subscribers: Vec<UnboundedSender<TrackingEvent>>,
}

impl EventSink {
    pub fn subscribe(&mut self) -> UnboundedReceiver<TrackingEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: TrackingEvent) {
        self.subscribers.retain(|tx| !tx.is_closed());
        for tx in &self.subscribers {
            let _ = tx.send(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_text() {
        let event = TrackingEvent::LoadProgress {
            source: "clip.mp4".to_string(),
            decoded: 1,
            percent: Some(100.0 / 3.0),
        };
        assert_eq!(event.to_string(), "Reading clip.mp4, progress: 33.33%");

        let event = TrackingEvent::LoadProgress {
            source: "clip.mp4".to_string(),
            decoded: 12,
            percent: None,
        };
        assert_eq!(event.to_string(), "Reading clip.mp4, 12 frames");
    }

    #[test]
    fn sink_delivers_to_all_live_subscribers() {
        let mut sink = EventSink::default();
        let mut first = sink.subscribe();
        let second = sink.subscribe();
        drop(second);

        sink.emit(TrackingEvent::RoiUpdated);
        assert_eq!(first.try_recv().unwrap(), TrackingEvent::RoiUpdated);
        assert_eq!(sink.subscribers.len(), 1);
    }
}
