use super::{IntPoint, IntSize};

/// Axis-aligned rectangle in device pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    pub origin: IntPoint,
    pub size: IntSize,
}

impl IntRect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            origin: IntPoint::new(x, y),
            size: IntSize::new(width, height),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: IntPoint, size: IntSize) -> Self {
        Self { origin, size }
    }

    /// Rectangle anchored at the origin covering `size`.
    #[inline]
    pub const fn from_size(size: IntSize) -> Self {
        Self {
            origin: IntPoint::zero(),
            size,
        }
    }

    #[inline]
    pub fn min(self) -> IntPoint {
        self.origin
    }

    #[inline]
    pub fn max(self) -> IntPoint {
        IntPoint::new(clamp_coord(self.right()), clamp_coord(self.bottom()))
    }

    #[inline]
    fn right(self) -> i64 {
        self.origin.x as i64 + self.size.width as i64
    }

    #[inline]
    fn bottom(self) -> i64 {
        self.origin.y as i64 + self.size.height as i64
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.is_empty()
    }

    #[inline]
    pub fn area(self) -> usize {
        self.size.area()
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: IntPoint) -> bool {
        let (x, y) = (p.x as i64, p.y as i64);
        x >= self.origin.x as i64 && y >= self.origin.y as i64 && x < self.right() && y < self.bottom()
    }

    #[inline]
    pub fn intersect(self, other: IntRect) -> Option<IntRect> {
        let x0 = (self.origin.x as i64).max(other.origin.x as i64);
        let y0 = (self.origin.y as i64).max(other.origin.y as i64);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());

        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some(IntRect::new(x0 as i32, y0 as i32, clamp_extent(x1 - x0), clamp_extent(y1 - y0)))
        }
    }

    /// Smallest rectangle covering both. Empty rectangles are ignored.
    pub fn union(self, other: IntRect) -> IntRect {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }

        let x0 = (self.origin.x as i64).min(other.origin.x as i64);
        let y0 = (self.origin.y as i64).min(other.origin.y as i64);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());

        IntRect::new(x0 as i32, y0 as i32, clamp_extent(x1 - x0), clamp_extent(y1 - y0))
    }
}

#[inline]
fn clamp_coord(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[inline]
fn clamp_extent(v: i64) -> u32 {
    u32::try_from(v).unwrap_or(if v < 0 { 0 } else { u32::MAX })
}
