//! Run lifecycle types shared by every game
//!
//! Per-game entity state lives in the game modules; this is what the engine
//! and host agree on: phase, RNG seeding, telemetry events, and the
//! read-only snapshot handed to renderers.

use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::CrashCause;
use super::flappy::FlappyView;
use super::racer::RacerView;
use super::snake::SnakeView;
use crate::settings::GameKind;

/// Current phase of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Nothing running, waiting for start
    Idle,
    /// Timers active, ticks mutate state
    Running,
    /// Frozen after a fatal collision, waiting for restart
    GameOver,
}

/// RNG seed and per-run stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::new(self.seed, self.stream)
    }

    /// Move to the next run's stream and build its generator
    pub fn next_run(&mut self) -> Pcg32 {
        self.stream = self.stream.wrapping_add(1);
        self.to_rng()
    }
}

/// Telemetry emitted by the engine, drained by the host (HUD, audio, logs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted { run: u64 },
    /// Obstacle or food placed
    Spawned,
    /// Off-screen obstacles removed
    Pruned { count: usize },
    Scored { points: u64, total: u64 },
    Crashed { cause: CrashCause, score: u64, tick: u64 },
    /// Run stopped by the host before it ended
    RunAbandoned { score: u64 },
}

/// Per-game view of the world, copied out of the live state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum WorldView {
    Snake(SnakeView),
    Flappy(FlappyView),
    Racer(RacerView),
}

/// Read-only copy of a game for renderers and score displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub kind: GameKind,
    pub phase: GamePhase,
    pub score: u64,
    pub best: u64,
    pub is_over: bool,
    pub tick: u64,
    pub world: WorldView,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_run_streams_differ() {
        let mut state = RngState::new(7);
        let a: u32 = state.next_run().random();
        let b: u32 = state.next_run().random();
        assert_ne!(a, b);
    }

    #[test]
    fn test_same_stream_same_sequence() {
        let state = RngState::new(7);
        let a: u64 = state.to_rng().random();
        let b: u64 = state.to_rng().random();
        assert_eq!(a, b);
    }
}
