use log::{trace, warn};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::TrackerConfig;
use crate::detection::Detection;
use crate::error::Error;
use crate::frame::Frame;
use crate::record::{LicensePlate, ObjectRecords};
use crate::scene::Scene;
use crate::{Track, Tracking};

/// Associates per-frame detections into tracks and accumulates one
/// [`ObjectRecord`](crate::record::ObjectRecord) per track.
pub struct Aggregator {
    scene: Scene,
}

impl Aggregator {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            scene: Scene::new(config),
        }
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        self.scene.config()
    }

    /// Tracks a single still image as frame 0.
    pub fn process_image(
        config: TrackerConfig,
        detections: Vec<Detection>,
        plates: Vec<Detection>,
    ) -> Result<ObjectRecords, Error> {
        let mut aggregator = Self::new(config);
        aggregator.update(&Frame::new(0, detections).with_plates(plates))?;

        Ok(aggregator.records())
    }

    /// Feeds frames in order, checking `cancel` between frames. Returns the
    /// number of processed frames.
    pub fn run<I>(&mut self, frames: I, cancel: &AtomicBool) -> Result<usize, Error>
    where
        I: IntoIterator<Item = Frame>,
    {
        let mut processed = 0;

        for frame in frames {
            if cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled { processed });
            }

            self.update(&frame)?;
            processed += 1;
        }

        Ok(processed)
    }

    /// Active tracks per vehicle type.
    pub fn live_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();

        for t in self.scene.tracks.iter().filter(|t| t.is_active()) {
            *counts.entry(t.record.vehicle_type.clone()).or_insert(0) += 1;
        }

        counts
    }

    fn attach_plates(&mut self, frame: i64, plates: &[Detection], observed: &[usize]) {
        let tracks = &mut self.scene.tracks;

        for plate in plates {
            let pbox = plate.bbox();
            let center = pbox.as_xywh();
            let area = plate.area();

            let mut best: Option<(usize, f32)> = None;
            for &i in observed {
                let vbox = &tracks[i].record.vehicle_bbox;
                if !vbox.contains_point(center.cx(), center.cy()) {
                    continue;
                }

                let coverage = pbox.intersection(vbox) / area;
                best = match best {
                    Some((bi, bc))
                        if bc > coverage || (bc == coverage && tracks[bi].id < tracks[i].id) =>
                    {
                        Some((bi, bc))
                    }
                    _ => Some((i, coverage)),
                };
            }

            match best {
                Some((i, _)) => {
                    let kept = tracks[i].record.offer_plate(LicensePlate {
                        bbox: pbox,
                        bbox_score: plate.confidence(),
                    });

                    if kept {
                        trace!(
                            "frame {}: track {} plate score {:.4}",
                            frame,
                            tracks[i].id,
                            plate.confidence()
                        );
                    }
                }
                None => trace!("frame {}: plate outside tracked vehicles", frame),
            }
        }
    }
}

fn valid_detections(frame: i64, kind: &str, dets: &[Detection]) -> Vec<Detection> {
    dets.iter()
        .filter(|det| match det.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!("frame {}: {} rejected: {}", frame, kind, err);
                false
            }
        })
        .copied()
        .collect()
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl Tracking for Aggregator {
    fn update(&mut self, frame: &Frame) -> Result<(), Error> {
        self.scene.advance_to(frame.index)?;

        let dets = valid_detections(frame.index, "detection", &frame.detections);
        let mapping = self.scene.map_detections(frame.index, &dets);
        let observed = self.scene.update(mapping);

        let plates = valid_detections(frame.index, "plate", &frame.plates);
        self.attach_plates(frame.index, &plates, &observed);

        Ok(())
    }

    #[inline]
    fn tracks(&self) -> Rc<[Track]> {
        self.scene.tracks().into_boxed_slice().into()
    }

    #[inline]
    fn records(&self) -> ObjectRecords {
        self.scene.records()
    }
}
