//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed step per tick (the game's cadence)
//! - Seeded RNG only
//! - Stable iteration order (insertion order of entities)
//! - No rendering or browser dependencies

pub mod collision;
pub mod flappy;
pub mod geom;
pub mod racer;
pub mod snake;
pub mod state;
pub mod tick;

pub use collision::{Collision, CrashCause};
pub use flappy::{Flappy, FlappyView, Pipe};
pub use geom::{Heading, Rect};
pub use racer::{Obstacle, Racer, RacerView};
pub use snake::{Snake, SnakeView};
pub use state::{GameEvent, GamePhase, RngState, Snapshot, WorldView};
pub use tick::{ArcadeGame, Engine, Simulation, TickOutcome};
