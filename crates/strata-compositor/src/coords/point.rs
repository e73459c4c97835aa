use core::ops::{Add, Sub};

/// Point (or offset) in device pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

impl IntPoint {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl Add for IntPoint {
    type Output = IntPoint;
    #[inline]
    fn add(self, rhs: IntPoint) -> IntPoint {
        IntPoint::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for IntPoint {
    type Output = IntPoint;
    #[inline]
    fn sub(self, rhs: IntPoint) -> IntPoint {
        IntPoint::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}
