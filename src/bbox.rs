use std::marker::PhantomData;

pub trait BBoxFormat: std::fmt::Debug {}

/// Left-top-right-bottom format, contains left top and right bottom corners
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// X-y-width-height format, contains coordinates of the center of bbox and width-height
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Xywh;
impl BBoxFormat for Xywh {}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        BBox([x1, y1, x2, y2], Default::default())
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }

    /// Integer corners, truncated toward zero.
    #[inline]
    pub fn as_xyxy(&self) -> [i32; 4] {
        [
            self.0[0] as i32,
            self.0[1] as i32,
            self.0[2] as i32,
            self.0[3] as i32,
        ]
    }

    /// Area shared with `other`, zero when the boxes are disjoint.
    #[inline]
    pub fn intersection(&self, other: &BBox<Ltrb>) -> f32 {
        let iw = (self.right().min(other.right()) - self.left().max(other.left())).max(0.0);
        let ih = (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.0);

        iw * ih
    }

    #[inline]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }

    #[inline]
    pub fn as_xywh(&self) -> BBox<Xywh> {
        self.into()
    }
}

impl BBox<Xywh> {
    #[inline(always)]
    pub fn cx(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        self.0[1]
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Xywh> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        let w = v.0[2] - v.0[0];
        let h = v.0[3] - v.0[1];

        Self(
            [v.0[0] + w / 2.0, v.0[1] + h / 2.0, w, h],
            Default::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ltrb_to_xywh() {
        let b = BBox::ltrb(10.0, 20.0, 50.0, 100.0);

        let xywh = b.as_xywh();
        assert_eq!((xywh.cx(), xywh.cy()), (30.0, 60.0));
    }

    #[test]
    fn test_as_xyxy_truncates() {
        let b = BBox::ltrb(10.9, 20.1, 50.5, 99.99);
        assert_eq!(b.as_xyxy(), [10, 20, 50, 99]);
    }

    #[test]
    fn test_intersection_disjoint_is_zero() {
        let a = BBox::ltrb(0.0, 0.0, 10.0, 10.0);
        let b = BBox::ltrb(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.intersection(&b), 0.0);
        assert!(a.contains_point(5.0, 10.0));
        assert!(!a.contains_point(5.0, 10.5));
    }
}
