use log::{debug, trace, warn};
use munkres::{solve_assignment, WeightMatrix};
use ndarray::Array1;

use crate::circular_queue::CircularQueue;
use crate::classes::ClassMap;
use crate::config::TrackerConfig;
use crate::detection::{boxes_array, Detection};
use crate::error::Error;
use crate::record::{ObjectRecord, ObjectRecords};
use crate::track::{Track, TrackState};

const HISTORY_LEN: usize = 16;

// cost of a pairing that can never be accepted, and of matrix padding
const REJECTED_COST: f32 = 1.0;

/// Outcome of matching one frame's detections against the active tracks.
pub struct DetectionsMapping<'a> {
    frame: i64,
    detections: &'a [Detection],
    // (track index, detection index, iou)
    matched: Vec<(usize, usize, f32)>,
    missed: Vec<usize>,
}

impl<'a> DetectionsMapping<'a> {
    #[inline]
    pub fn missed(&self) -> impl Iterator<Item = &'a Detection> + '_ {
        let dets = self.detections;
        self.missed.iter().map(move |&j| &dets[j])
    }
}

#[derive(Debug)]
pub struct Participant {
    pub id: u32,
    pub state: TrackState,
    pub class: i32,
    pub confidence: f32,
    pub hits_count: u32,
    pub detections: CircularQueue<(i64, Detection)>,
    pub record: ObjectRecord,
}

impl Participant {
    pub fn new(id: u32, frame: i64, det: &Detection, classes: &ClassMap) -> Self {
        let mut detections = CircularQueue::with_capacity(HISTORY_LEN);
        detections.push((frame, *det));

        Self {
            id,
            state: TrackState::Active,
            class: det.class_id(),
            confidence: det.confidence(),
            hits_count: 1,
            detections,
            record: ObjectRecord {
                vehicle_type: classes.resolve(det.class_id()).to_string(),
                vehicle_bbox: det.bbox(),
                license_plate: None,
                frame_start: frame,
                frame_end: frame,
            },
        }
    }

    pub fn update(&mut self, frame: i64, det: &Detection, classes: &ClassMap) {
        self.detections.push((frame, *det));
        self.hits_count += 1;

        self.record.vehicle_bbox = det.bbox();
        self.record.frame_end = frame;

        if det.confidence() > self.confidence {
            self.confidence = det.confidence();
            self.class = det.class_id();
            self.record.vehicle_type = classes.resolve(det.class_id()).to_string();
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == TrackState::Active
    }

    pub fn close(&mut self) {
        self.state = TrackState::Closed;
    }

    #[inline]
    pub fn time_since_update(&self, frame: i64) -> i64 {
        frame - self.record.frame_end
    }

    /// Representative box of the track as a detection.
    pub fn last_detection(&self) -> Detection {
        let b = &self.record.vehicle_bbox;
        Detection::new(
            b.left(),
            b.top(),
            b.right(),
            b.bottom(),
            self.confidence,
            self.class,
        )
    }

    pub fn iou_slip(&self) -> f32 {
        let mut detections = self.detections.iter();

        match (detections.next(), detections.next()) {
            (Some((_, last)), Some((_, prev))) => last.iou(prev),
            _ => 0.,
        }
    }

    pub fn snapshot(&self, frame: i64) -> Track {
        Track {
            track_id: self.id,
            state: self.state,
            time_since_update: self.time_since_update(frame),
            class: self.class,
            confidence: self.confidence,
            hits: self.hits_count,
            iou_slip: self.iou_slip(),
            bbox: self.record.vehicle_bbox,
        }
    }
}

/// Track set of one run. Tracks are kept in creation order, which is also
/// ascending id order.
pub struct Scene {
    pub tracks: Vec<Participant>,
    config: TrackerConfig,
    next_id: u32,
    last_frame: Option<i64>,
}

impl Scene {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            tracks: Vec::with_capacity(64),
            config,
            next_id: 1,
            last_frame: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn last_frame(&self) -> Option<i64> {
        self.last_frame
    }

    /// Optimal assignment maximizing summed IoU. Rows are the tracks in id
    /// order, columns the detections in input order, so equal-cost
    /// solutions always resolve the same way.
    fn assignment(
        &self,
        dets: &[Detection],
        objs: &[usize],
    ) -> (Vec<(usize, usize, f32)>, Vec<usize>) {
        let mut missed: Vec<_> = (0..dets.len()).collect();

        if objs.is_empty() || dets.is_empty() {
            return (Vec::new(), missed);
        }

        let min_iou = self.config.min_iou;
        let boxes = boxes_array(dets);
        let ious: Vec<Array1<f32>> = objs
            .iter()
            .map(|&i| self.tracks[i].last_detection().iou_batch(boxes.view()))
            .collect();

        let n = dets.len().max(objs.len());
        let mut mat = WeightMatrix::from_fn(n, |(r, c)| {
            if r < objs.len() && c < dets.len() && ious[r][c] >= min_iou {
                1.0 - ious[r][c]
            } else {
                REJECTED_COST
            }
        });

        let mut assignments: Vec<_> = match solve_assignment(&mut mat) {
            Ok(inner) => inner
                .into_iter()
                .filter(|p| p.row < objs.len() && p.column < dets.len())
                .map(|p| (p.row, p.column, ious[p.row][p.column]))
                .filter(|&(_, _, iou)| iou >= min_iou)
                .map(|(r, c, iou)| (objs[r], c, iou))
                .collect(),
            Err(err) => {
                warn!("assignment could not be solved: {:?}", err);
                Vec::new()
            }
        };

        assignments.sort_by_key(|&(i, _, _)| i);
        missed.retain(|&x| !assignments.iter().any(|&(_, p, _)| p == x));

        (assignments, missed)
    }

    /// Moves the scene to `frame`, closing tracks whose gap since the last
    /// match already exceeds the allowed number of missed frames.
    pub fn advance_to(&mut self, frame: i64) -> Result<(), Error> {
        if let Some(last) = self.last_frame {
            if frame <= last {
                return Err(Error::FrameOrder { last, got: frame });
            }
        }

        let max_missed = self.config.max_missed_frames as i64;
        for t in self.tracks.iter_mut().filter(|t| t.is_active()) {
            if t.time_since_update(frame) - 1 > max_missed {
                debug!("track {} closed after frame {}", t.id, t.record.frame_end);
                t.close();
            }
        }

        self.last_frame = Some(frame);

        Ok(())
    }

    pub fn map_detections<'a>(
        &self,
        frame: i64,
        detections: &'a [Detection],
    ) -> DetectionsMapping<'a> {
        let active: Vec<usize> = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_active())
            .map(|(idx, _)| idx)
            .collect();

        let (matched, missed) = self.assignment(detections, &active);

        DetectionsMapping {
            frame,
            detections,
            matched,
            missed,
        }
    }

    /// Applies a mapping and returns the indices of the tracks observed in
    /// its frame, matched ones first.
    pub fn update(&mut self, mapping: DetectionsMapping<'_>) -> Vec<usize> {
        let frame = mapping.frame;
        let dets = mapping.detections;
        let mut observed = Vec::with_capacity(dets.len());

        for &(i, j, score) in &mapping.matched {
            trace!("frame {}: track {} matched, iou {:.3}", frame, self.tracks[i].id, score);
            self.tracks[i].update(frame, &dets[j], &self.config.classes);
            observed.push(i);
        }

        let max_missed = self.config.max_missed_frames as i64;
        for t in self.tracks.iter_mut().filter(|t| t.is_active()) {
            if t.time_since_update(frame) > max_missed {
                debug!("track {} closed after frame {}", t.id, t.record.frame_end);
                t.close();
            }
        }

        for det in mapping.missed() {
            let id = self.next_id;
            self.next_id += 1;

            debug!(
                "frame {}: track {} created ({})",
                frame,
                id,
                self.config.classes.resolve(det.class_id())
            );

            observed.push(self.tracks.len());
            self.tracks
                .push(Participant::new(id, frame, det, &self.config.classes));
        }

        observed
    }

    pub fn tracks(&self) -> Vec<Track> {
        let frame = self.last_frame.unwrap_or_default();

        self.tracks
            .iter()
            .filter(|t| t.is_active())
            .map(|t| t.snapshot(frame))
            .collect()
    }

    pub fn records(&self) -> ObjectRecords {
        self.tracks
            .iter()
            .map(|t| (t.id, t.record.clone()))
            .collect()
    }
}
