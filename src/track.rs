use crate::bbox::{BBox, Ltrb};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Active,
    /// Terminal: excluded from matching, kept in the records.
    Closed,
}

#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: u32,
    pub state: TrackState,
    // frames since the last match
    pub time_since_update: i64,
    pub class: i32,
    pub confidence: f32,
    // matched detections so far, the first one included
    pub hits: u32,
    pub iou_slip: f32,
    pub bbox: BBox<Ltrb>,
}
