use crate::detection::Detection;

/// Detections of one frame. `plates` holds sub-detections (license plates)
/// which are attached to the vehicles tracked in the same frame.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub index: i64,
    pub detections: Vec<Detection>,
    pub plates: Vec<Detection>,
}

impl Frame {
    #[inline]
    pub fn new(index: i64, detections: Vec<Detection>) -> Self {
        Self {
            index,
            detections,
            plates: Vec::new(),
        }
    }

    #[inline]
    pub fn with_plates(mut self, plates: Vec<Detection>) -> Self {
        self.plates = plates;
        self
    }

    /// Builds a frame from raw detector rows, dropping malformed rows.
    pub fn from_rows<R: AsRef<[f32]>>(index: i64, detections: &[R], plates: &[R]) -> Self {
        Self {
            index,
            detections: parse_rows(index, detections),
            plates: parse_rows(index, plates),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

fn parse_rows<R: AsRef<[f32]>>(index: i64, rows: &[R]) -> Vec<Detection> {
    rows.iter()
        .filter_map(|row| match Detection::try_from(row.as_ref()) {
            Ok(det) => Some(det),
            Err(err) => {
                log::warn!("frame {}: dropping detection: {}", index, err);
                None
            }
        })
        .collect()
}
