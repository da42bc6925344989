//! Axis-aligned rectangles
//!
//! Used for quadtree boundaries, body bounding boxes and query ranges.
//! `(x, y)` is the top-left corner in screen space (+y down).

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of the given half extents around `center`
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            x: center.x - half.x,
            y: center.y - half.y,
            w: half.x * 2.0,
            h: half.y * 2.0,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Closed intersection test (touching edges count as intersecting)
    ///
    /// NaN coordinates never intersect anything.
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        other.x <= self.right()
            && other.right() >= self.x
            && other.y <= self.bottom()
            && other.bottom() >= self.y
    }

    /// Grow by `margin` on every side
    pub fn expand(&self, margin: Vec2) -> Self {
        Self {
            x: self.x - margin.x,
            y: self.y - margin.y,
            w: self.w + margin.x * 2.0,
            h: self.h + margin.y * 2.0,
        }
    }

    /// Smallest rectangle containing both
    pub fn union(&self, other: &Rect) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            w: self.right().max(other.right()) - x,
            h: self.bottom().max(other.bottom()) - y,
        }
    }

    /// The four equal quadrants, in NW, NE, SW, SE order
    pub fn quadrants(&self) -> [Rect; 4] {
        let w = self.w / 2.0;
        let h = self.h / 2.0;
        [
            Rect::new(self.x, self.y, w, h),
            Rect::new(self.x + w, self.y, w, h),
            Rect::new(self.x, self.y + h, w, h),
            Rect::new(self.x + w, self.y + h, w, h),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(10.0, 0.0, 5.0, 5.0)));
        assert!(!a.intersects(&Rect::new(10.1, 0.0, 5.0, 5.0)));
        assert!(!a.intersects(&Rect::new(0.0, -5.0, 5.0, 4.9)));
    }

    #[test]
    fn test_nan_never_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&Rect::new(f32::NAN, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_quadrants_tile_parent() {
        let parent = Rect::new(0.0, 0.0, 100.0, 50.0);
        let [nw, ne, sw, se] = parent.quadrants();
        assert_eq!(nw, Rect::new(0.0, 0.0, 50.0, 25.0));
        assert_eq!(ne, Rect::new(50.0, 0.0, 50.0, 25.0));
        assert_eq!(sw, Rect::new(0.0, 25.0, 50.0, 25.0));
        assert_eq!(se, Rect::new(50.0, 25.0, 50.0, 25.0));
    }

    #[test]
    fn test_expand_and_union() {
        let r = Rect::from_center(Vec2::new(5.0, 5.0), Vec2::splat(1.0));
        assert_eq!(r.expand(Vec2::splat(1.0)), Rect::new(3.0, 3.0, 4.0, 4.0));
        let u = r.union(&Rect::new(20.0, 0.0, 1.0, 1.0));
        assert_eq!(u, Rect::new(4.0, 0.0, 17.0, 6.0));
    }
}
