//! Neon Arcade - three timer-driven arcade mini-games
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, spawning, collisions, game state)
//! - `platform`: Virtual timers, input mapping and the browser host binding
//! - `arcade`: Mounts one game at a time and carries best scores across mounts
//! - `highscores`: Session leaderboard per game
//! - `settings`: Data-driven game tuning

pub mod arcade;
pub mod highscores;
pub mod platform;
pub mod settings;
pub mod sim;

pub use arcade::Arcade;
pub use highscores::HighScores;
pub use settings::{ArcadeConfig, ConfigError, GameKind};
