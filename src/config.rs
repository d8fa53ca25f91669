use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::frame::Pixel;

pub const DEFAULT_ROI_SIZE: u32 = 50;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Side length of the preview square and of exported patches.
    pub roi_size: u32,
    pub outline_color: [u8; 3],
    pub outline_thickness: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            roi_size: DEFAULT_ROI_SIZE,
            outline_color: [255, 0, 0],
            outline_thickness: 2,
        }
    }
}

impl TrackerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TrackerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.roi_size == 0 {
            return Err(Error::InvalidConfig("roi_size must be at least 1".to_string()));
        }
        if self.outline_thickness == 0 {
            return Err(Error::InvalidConfig(
                "outline_thickness must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn outline_pixel(&self) -> Pixel {
        image::Rgb(self.outline_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let config: TrackerConfig = serde_json::from_str(r#"{ "roi_size": 32 }"#).unwrap();
        assert_eq!(config.roi_size, 32);
        assert_eq!(config.outline_color, [255, 0, 0]);
        assert_eq!(config.outline_thickness, 2);
    }

    #[test]
    fn zero_roi_size_is_rejected() {
        let config = TrackerConfig {
            roi_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn config_from_file() {
        let dir = tempdir::TempDir::new("roi-annotator-config").unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "outline_color": [0, 255, 0], "outline_thickness": 1 }"#)
            .unwrap();

        let config = TrackerConfig::from_file(&path).unwrap();
        assert_eq!(config.roi_size, DEFAULT_ROI_SIZE);
        assert_eq!(config.outline_pixel(), image::Rgb([0, 255, 0]));
        assert_eq!(config.outline_thickness, 1);
    }
}
