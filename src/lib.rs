pub mod bbox;
pub mod classes;
pub mod config;
pub mod detection;
pub mod error;
pub mod frame;
pub mod math;
pub mod record;
pub mod report;
pub mod scene;
pub mod tracker;
pub mod visual;

mod circular_queue;
mod track;

pub use classes::ClassMap;
pub use config::TrackerConfig;
pub use detection::Detection;
pub use error::Error;
pub use frame::Frame;
pub use record::{LicensePlate, ObjectRecord, ObjectRecords};
pub use report::{read_json, write_csv, write_json, Report};
pub use track::{Track, TrackState};
pub use tracker::Aggregator;

use std::rc::Rc;

/// Frame-by-frame association of detections into persistent tracks.
pub trait Tracking {
    /// Consumes the next frame. Frame indices must be strictly increasing;
    /// skipped indices count as frames without detections.
    fn update(&mut self, frame: &Frame) -> Result<(), Error>;

    /// Snapshot of the tracks still open for matching.
    fn tracks(&self) -> Rc<[Track]>;

    /// Every track seen so far, open or closed, keyed by id.
    fn records(&self) -> ObjectRecords;
}
