//! Collision detection
//!
//! Every check here is exact for axis-aligned boxes. The per-game
//! detectors build on these and report a [`Collision`] once per tick.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashCause {
    /// Snake head left the grid
    Wall,
    /// Snake head ran into its own body
    SelfCollision,
    /// Player left the vertical world bounds
    OutOfBounds,
    /// Player overlapped an obstacle
    Obstacle,
}

/// Result of one tick's collision pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collision {
    /// Set when the run must end this tick
    pub fatal: Option<CrashCause>,
    /// Non-fatal contacts for the score stage (indices into the game's own
    /// entity lists: eaten food, passed pipes)
    pub contacts: Vec<usize>,
}

impl Collision {
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn fatal(cause: CrashCause) -> Self {
        Self {
            fatal: Some(cause),
            contacts: Vec::new(),
        }
    }
}

/// Check if the player box overlaps any obstacle box
pub fn rect_hits_any<'a>(player: &Rect, obstacles: impl IntoIterator<Item = &'a Rect>) -> bool {
    obstacles.into_iter().any(|o| player.overlaps(o))
}

/// Whether a box pokes out of the vertical band `[0, height]`
pub fn outside_vertical_band(rect: &Rect, height: f32) -> bool {
    rect.top() < 0.0 || rect.bottom() > height
}

/// Whether a cell lies inside a `size.x` × `size.y` grid
pub fn cell_in_grid(cell: IVec2, size: IVec2) -> bool {
    cell.x >= 0 && cell.y >= 0 && cell.x < size.x && cell.y < size.y
}

/// Whether a cell is occupied by any of the given segments
pub fn cell_hits<'a>(cell: IVec2, segments: impl IntoIterator<Item = &'a IVec2>) -> bool {
    segments.into_iter().any(|s| *s == cell)
}
