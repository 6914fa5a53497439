use ndarray::{Array1, Array2, ArrayView2, Zip};

use crate::bbox::{BBox, Ltrb};
use crate::error::Error;

const IOU_EPSILON: f32 = 1e-6;

/// Unassigned class id.
pub const NO_CLASS: i32 = -1;

/// Axis-aligned box in left-top-right-bottom pixel coordinates together with
/// the detector's confidence and class id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    confidence: f32,
    class_id: i32,
}

#[inline(always)]
fn iou_kernel(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let iw = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let ih = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = iw * ih;

    if inter == 0.0 {
        return 0.0;
    }

    let a1 = (a[2] - a[0]) * (a[3] - a[1]);
    let a2 = (b[2] - b[0]) * (b[3] - b[1]);

    inter / (a1 + a2 - inter + IOU_EPSILON)
}

impl Detection {
    #[inline]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32, class_id: i32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class_id,
        }
    }

    #[inline]
    pub fn from_ltrb(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1, y1, x2, y2, 0.0, NO_CLASS)
    }

    #[inline(always)]
    pub fn x1(&self) -> f32 {
        self.x1
    }

    #[inline(always)]
    pub fn y1(&self) -> f32 {
        self.y1
    }

    #[inline(always)]
    pub fn x2(&self) -> f32 {
        self.x2
    }

    #[inline(always)]
    pub fn y2(&self) -> f32 {
        self.y2
    }

    #[inline(always)]
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    #[inline(always)]
    pub fn class_id(&self) -> i32 {
        self.class_id
    }

    #[inline(always)]
    pub fn coords(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    #[inline(always)]
    pub fn bbox(&self) -> BBox<Ltrb> {
        BBox::ltrb(self.x1, self.y1, self.x2, self.y2)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1) * (self.y2 - self.y1)
    }

    /// Checks that coordinates are finite and ordered and that the
    /// confidence lies in `[0, 1]`.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.coords().iter().all(|c| c.is_finite()) {
            return Err(Error::InvalidGeometry(format!(
                "non-finite coordinates {:?}",
                self.coords()
            )));
        }

        if self.x1 >= self.x2 || self.y1 >= self.y2 {
            return Err(Error::InvalidGeometry(format!(
                "inverted or empty box {:?}",
                self.coords()
            )));
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::InvalidGeometry(format!(
                "confidence {} out of range",
                self.confidence
            )));
        }

        Ok(())
    }

    /// Intersection over union. The denominator carries a `1e-6` guard, so
    /// the IoU of a tiny box with itself is slightly below `1.0` (about
    /// `0.999999` for a 1x1 box).
    pub fn iou(&self, other: &Detection) -> f32 {
        iou_kernel(&self.coords(), &other.coords())
    }

    /// IoU of `self` against every row of an `n x 4` ltrb matrix.
    ///
    /// # Panics
    ///
    /// Panics if `others` does not have exactly 4 columns.
    pub fn iou_batch(&self, others: ArrayView2<'_, f32>) -> Array1<f32> {
        assert_eq!(others.ncols(), 4, "iou_batch expects an n x 4 ltrb matrix");
        let a = self.coords();

        Zip::from(others.rows()).map_collect(|row| {
            let b = [row[0], row[1], row[2], row[3]];
            iou_kernel(&a, &b)
        })
    }

    pub fn iou_many(&self, others: &[Detection]) -> Vec<f32> {
        self.iou_batch(boxes_array(others).view()).to_vec()
    }
}

/// Stacks detections into an `n x 4` ltrb matrix for [`Detection::iou_batch`].
pub fn boxes_array(dets: &[Detection]) -> Array2<f32> {
    let mut arr = Array2::zeros((dets.len(), 4));

    for (mut row, det) in arr.rows_mut().into_iter().zip(dets) {
        row[0] = det.x1;
        row[1] = det.y1;
        row[2] = det.x2;
        row[3] = det.y2;
    }

    arr
}

/// Rows of `x1 y1 x2 y2 [confidence [class]]` as produced by the detector.
impl TryFrom<&[f32]> for Detection {
    type Error = Error;

    fn try_from(row: &[f32]) -> Result<Self, Self::Error> {
        match *row {
            [x1, y1, x2, y2] => Ok(Detection::from_ltrb(x1, y1, x2, y2)),
            [x1, y1, x2, y2, p] => Ok(Detection::new(x1, y1, x2, y2, p, NO_CLASS)),
            [x1, y1, x2, y2, p, c] => Ok(Detection::new(x1, y1, x2, y2, p, c as i32)),
            _ => Err(Error::MalformedDetection { len: row.len() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes() -> Vec<Detection> {
        vec![
            Detection::new(0.0, 0.0, 100.0, 100.0, 0.9, 2),
            Detection::new(50.0, 50.0, 150.0, 150.0, 0.8, 2),
            Detection::new(200.0, 200.0, 260.0, 240.0, 0.7, 2),
            Detection::new(10.0, 10.0, 90.0, 90.0, 0.6, 7),
            Detection::new(99.5, 0.0, 180.25, 100.0, 0.5, 7),
        ]
    }

    #[test]
    fn test_iou_self_is_one() {
        for b in boxes() {
            assert_eq!(b.iou(&b), 1.0);
        }
    }

    #[test]
    fn test_iou_self_of_unit_box() {
        let a = Detection::from_ltrb(3.0, 4.0, 4.0, 5.0);
        let iou = a.iou(&a);
        assert!(iou < 1.0);
        assert!((iou - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_iou_symmetric() {
        let bs = boxes();
        for a in &bs {
            for b in &bs {
                assert_eq!(a.iou(b), b.iou(a));
            }
        }
    }

    #[test]
    fn test_iou_disjoint_is_zero() {
        let a = Detection::from_ltrb(0.0, 0.0, 10.0, 10.0);
        let b = Detection::from_ltrb(10.0, 0.0, 20.0, 10.0);
        let c = Detection::from_ltrb(30.0, 30.0, 40.0, 40.0);

        assert_eq!(a.iou(&b), 0.0);
        assert_eq!(a.iou(&c), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = Detection::from_ltrb(0.0, 0.0, 100.0, 100.0);
        let b = Detection::from_ltrb(50.0, 50.0, 150.0, 150.0);

        // 2500 / (10000 + 10000 - 2500)
        assert!((a.iou(&b) - 2500.0 / 17500.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_degenerate_boxes() {
        let a = Detection::from_ltrb(5.0, 5.0, 5.0, 5.0);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn test_iou_batch_matches_scalar() {
        let bs = boxes();
        for a in &bs {
            let batch = a.iou_many(&bs);
            assert_eq!(batch.len(), bs.len());
            for (score, b) in batch.iter().zip(&bs) {
                assert_eq!(*score, a.iou(b));
            }
        }
    }

    #[test]
    fn test_iou_batch_empty() {
        let a = Detection::from_ltrb(0.0, 0.0, 1.0, 1.0);
        assert!(a.iou_many(&[]).is_empty());
    }

    #[test]
    #[should_panic(expected = "n x 4")]
    fn test_iou_batch_rejects_narrow_matrix() {
        let a = Detection::from_ltrb(0.0, 0.0, 1.0, 1.0);
        let others = Array2::<f32>::zeros((2, 3));
        a.iou_batch(others.view());
    }

    #[test]
    fn test_validate() {
        assert!(Detection::new(0.0, 0.0, 1.0, 1.0, 0.5, 2).validate().is_ok());
        assert!(Detection::from_ltrb(10.0, 0.0, 1.0, 1.0).validate().is_err());
        assert!(Detection::from_ltrb(0.0, 0.0, f32::NAN, 1.0).validate().is_err());
        assert!(Detection::new(0.0, 0.0, 1.0, 1.0, 1.5, 2).validate().is_err());
    }

    #[test]
    fn test_try_from_rows() {
        let d = Detection::try_from(&[1.0f32, 2.0, 3.0, 4.0][..]).unwrap();
        assert_eq!(d.class_id(), NO_CLASS);
        assert_eq!(d.confidence(), 0.0);

        let d = Detection::try_from(&[1.0f32, 2.0, 3.0, 4.0, 0.5, 2.0][..]).unwrap();
        assert_eq!(d.class_id(), 2);
        assert_eq!(d.confidence(), 0.5);

        match Detection::try_from(&[1.0f32, 2.0, 3.0][..]) {
            Err(Error::MalformedDetection { len }) => assert_eq!(len, 3),
            other => panic!("unexpected {:?}", other),
        }
    }
}
