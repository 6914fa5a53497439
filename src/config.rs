use serde_derive::Deserialize;
use std::path::Path;

use crate::classes::ClassMap;
use crate::error::Error;

pub const DEFAULT_MIN_IOU: f32 = 0.3;
pub const DEFAULT_MAX_MISSED_FRAMES: u32 = 30;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Pairings with a lower IoU are never matched.
    pub min_iou: f32,
    /// A track unmatched for more consecutive frames than this is closed.
    pub max_missed_frames: u32,
    pub classes: ClassMap,
}

impl TrackerConfig {
    pub fn new(classes: ClassMap) -> Self {
        Self {
            min_iou: DEFAULT_MIN_IOU,
            max_missed_frames: DEFAULT_MAX_MISSED_FRAMES,
            classes,
        }
    }

    pub fn with_min_iou(mut self, min_iou: f32) -> Self {
        self.min_iou = min_iou;
        self
    }

    pub fn with_max_missed_frames(mut self, frames: u32) -> Self {
        self.max_missed_frames = frames;
        self
    }

    pub fn from_json(src: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(src)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let src = std::fs::read_to_string(path)?;
        Self::from_json(&src)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new(ClassMap::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = TrackerConfig::from_json(r#"{"max_missed_frames": 5}"#).unwrap();
        assert_eq!(cfg.max_missed_frames, 5);
        assert_eq!(cfg.min_iou, DEFAULT_MIN_IOU);
        assert_eq!(cfg.classes, ClassMap::default());
    }

    #[test]
    fn test_classes_from_json() {
        let cfg = TrackerConfig::from_json(r#"{"classes": {"3": "motorcycle"}}"#).unwrap();
        assert_eq!(cfg.classes.resolve(3), "motorcycle");
        assert_eq!(cfg.classes.resolve(2), "unknown");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            TrackerConfig::from_json("{min_iou"),
            Err(Error::Json(_))
        ));
    }
}
