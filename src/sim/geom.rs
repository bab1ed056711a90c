//! Geometry primitives shared by the three games
//!
//! Continuous games use axis-aligned rectangles in screen space (y grows
//! downward). The grid game uses integer cells; a cell is the degenerate
//! unit-square case of the same overlap test.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box, top-left anchored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Strict overlap: shared edges do not count, identical boxes always do
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

/// Grid heading (screen space: up is -y)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    pub fn opposite(self) -> Self {
        match self {
            Heading::Up => Heading::Down,
            Heading::Down => Heading::Up,
            Heading::Left => Heading::Right,
            Heading::Right => Heading::Left,
        }
    }

    /// One-cell step in this heading
    pub fn delta(self) -> IVec2 {
        match self {
            Heading::Up => IVec2::NEG_Y,
            Heading::Down => IVec2::Y,
            Heading::Left => IVec2::NEG_X,
            Heading::Right => IVec2::X,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
    }

    #[test]
    fn test_heading_opposites() {
        for h in [Heading::Up, Heading::Down, Heading::Left, Heading::Right] {
            assert_eq!(h.opposite().opposite(), h);
            assert_eq!(h.delta() + h.opposite().delta(), IVec2::ZERO);
        }
    }
}
