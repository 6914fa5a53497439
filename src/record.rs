use std::collections::BTreeMap;

use crate::bbox::{BBox, Ltrb};
use crate::classes::UNKNOWN_CLASS;

/// Frame index of a record that was never observed.
pub const UNSET_FRAME: i64 = -1;

/// Best sub-detection (license plate) seen inside a tracked vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LicensePlate {
    pub bbox: BBox<Ltrb>,
    pub bbox_score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub vehicle_type: String,
    pub vehicle_bbox: BBox<Ltrb>,
    pub license_plate: Option<LicensePlate>,
    pub frame_start: i64,
    pub frame_end: i64,
}

impl ObjectRecord {
    /// Keeps `plate` when it scores strictly higher than the stored one.
    pub fn offer_plate(&mut self, plate: LicensePlate) -> bool {
        match &self.license_plate {
            Some(best) if best.bbox_score >= plate.bbox_score => false,
            _ => {
                self.license_plate = Some(plate);
                true
            }
        }
    }

    /// Number of frames between first and last observation, inclusive.
    #[inline]
    pub fn span(&self) -> i64 {
        if self.frame_start < 0 || self.frame_end < self.frame_start {
            0
        } else {
            self.frame_end - self.frame_start + 1
        }
    }
}

impl Default for ObjectRecord {
    fn default() -> Self {
        Self {
            vehicle_type: UNKNOWN_CLASS.to_string(),
            vehicle_bbox: BBox::ltrb(0.0, 0.0, 0.0, 0.0),
            license_plate: None,
            frame_start: UNSET_FRAME,
            frame_end: UNSET_FRAME,
        }
    }
}

/// Finished records keyed by track id, iterated in id order.
pub type ObjectRecords = BTreeMap<u32, ObjectRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    fn plate(score: f32) -> LicensePlate {
        LicensePlate {
            bbox: BBox::ltrb(1.0, 1.0, 5.0, 3.0),
            bbox_score: score,
        }
    }

    #[test]
    fn test_offer_plate_keeps_best() {
        let mut rec = ObjectRecord::default();

        assert!(rec.offer_plate(plate(0.4)));
        assert!(!rec.offer_plate(plate(0.3)));
        assert!(!rec.offer_plate(plate(0.4)));
        assert!(rec.offer_plate(plate(0.7)));
        assert_eq!(rec.license_plate.map(|p| p.bbox_score), Some(0.7));
    }

    #[test]
    fn test_default_is_unobserved() {
        let rec = ObjectRecord::default();
        assert_eq!(rec.vehicle_type, "unknown");
        assert_eq!((rec.frame_start, rec.frame_end), (-1, -1));
        assert_eq!(rec.span(), 0);
    }
}
