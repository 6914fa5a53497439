//! Layout math for frame annotations. Only coordinates are produced here,
//! drawing is left to the caller's graphics backend.

use nalgebra as na;
use std::collections::BTreeMap;

use crate::bbox::{BBox, Ltrb};

pub const CORNER_FRACTION: f32 = 0.18;

const STATS_ORIGIN: (i32, i32) = (10, 26);
const STATS_FIRST_CLASS_Y: i32 = 50;
const STATS_LINE_STEP: i32 = 22;
const LABEL_MARGIN: i32 = 6;

pub type Segment = (na::Point2<i32>, na::Point2<i32>);

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub origin: na::Point2<i32>,
}

/// Eight short segments marking the corners of `bbox`, each `frac` of the
/// box width or height long.
pub fn corner_segments(bbox: &BBox<Ltrb>, frac: f32) -> Vec<Segment> {
    let [x1, y1, x2, y2] = bbox.as_xyxy();
    let dx = ((x2 - x1) as f32 * frac) as i32;
    let dy = ((y2 - y1) as f32 * frac) as i32;

    let mut segments = Vec::with_capacity(8);
    for (sx, sy) in [(x1, y1), (x2, y1), (x1, y2), (x2, y2)] {
        let ex = if sx == x1 { sx + dx } else { sx - dx };
        let ey = if sy == y1 { sy + dy } else { sy - dy };
        let start = na::Point2::new(sx, sy);

        segments.push((start, na::Point2::new(ex, sy)));
        segments.push((start, na::Point2::new(sx, ey)));
    }

    segments
}

/// Baseline origin for a label over `bbox`; falls below the box when there
/// is no room above it.
pub fn label_anchor(bbox: &BBox<Ltrb>, line_height: i32) -> na::Point2<i32> {
    let [x1, y1, _, y2] = bbox.as_xyxy();

    if y1 - LABEL_MARGIN < line_height {
        na::Point2::new(x1, y2 + line_height)
    } else {
        na::Point2::new(x1, y1 - LABEL_MARGIN)
    }
}

/// Overlay text: a totals line followed by one line per non-zero type.
pub fn stats_lines(fps: f32, counts: &BTreeMap<String, usize>) -> Vec<TextLine> {
    let total: usize = counts.values().sum();

    let mut lines = vec![TextLine {
        text: format!("FPS:{:5.1}  Vehicles:{}", fps, total),
        origin: na::Point2::new(STATS_ORIGIN.0, STATS_ORIGIN.1),
    }];

    let mut y = STATS_FIRST_CLASS_Y;
    for (name, &count) in counts.iter().filter(|&(_, &c)| c > 0) {
        lines.push(TextLine {
            text: format!("{}:{}", name, count),
            origin: na::Point2::new(STATS_ORIGIN.0, y),
        });
        y += STATS_LINE_STEP;
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_segments() {
        let segs = corner_segments(&BBox::ltrb(0.0, 0.0, 100.0, 50.0), CORNER_FRACTION);
        assert_eq!(segs.len(), 8);

        // top-left corner runs right and down
        assert_eq!(segs[0], (na::Point2::new(0, 0), na::Point2::new(18, 0)));
        assert_eq!(segs[1], (na::Point2::new(0, 0), na::Point2::new(0, 9)));
        // bottom-right corner runs left and up
        assert_eq!(segs[6], (na::Point2::new(100, 50), na::Point2::new(82, 50)));
        assert_eq!(segs[7], (na::Point2::new(100, 50), na::Point2::new(100, 41)));
    }

    #[test]
    fn test_label_anchor() {
        assert_eq!(
            label_anchor(&BBox::ltrb(10.0, 100.0, 60.0, 140.0), 20),
            na::Point2::new(10, 94)
        );
        assert_eq!(
            label_anchor(&BBox::ltrb(10.0, 5.0, 60.0, 40.0), 20),
            na::Point2::new(10, 60)
        );
    }

    #[test]
    fn test_stats_lines() {
        let mut counts = BTreeMap::new();
        counts.insert("car".to_string(), 3);
        counts.insert("bus".to_string(), 0);
        counts.insert("truck".to_string(), 1);

        let lines = stats_lines(29.97, &counts);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "FPS: 30.0  Vehicles:4");
        assert_eq!(lines[1].text, "car:3");
        assert_eq!(lines[1].origin, na::Point2::new(10, 50));
        assert_eq!(lines[2].text, "truck:1");
        assert_eq!(lines[2].origin, na::Point2::new(10, 72));
    }
}
