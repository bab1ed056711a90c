//! Game tuning and configuration
//!
//! Defaults reproduce the original games' feel. A host may override any
//! subset from JSON; missing fields keep their defaults.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::Cadence;
use crate::sim::geom::Heading;

/// Which mini-game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    Snake,
    Flappy,
    Racer,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Snake, GameKind::Flappy, GameKind::Racer];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Snake => "snake",
            GameKind::Flappy => "flappy",
            GameKind::Racer => "racer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "snake" => Some(GameKind::Snake),
            "flappy" | "flappybird" | "flappy-bird" => Some(GameKind::Flappy),
            "racer" | "racing" => Some(GameKind::Racer),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{game}: `{field}` must be positive")]
    NotPositive {
        game: &'static str,
        field: &'static str,
    },
    #[error("{game}: `{field}` must be a finite number")]
    NotFinite {
        game: &'static str,
        field: &'static str,
    },
    #[error("snake: start body must be non-empty, contiguous, non-overlapping and inside the grid")]
    BadStartBody,
    #[error("flappy: pipe gap of {gap} px cannot fit a {bird} px bird inside a {height} px world")]
    GapTooSmall { gap: f32, bird: f32, height: f32 },
    #[error("racer: `spawn_chance` must be within [0, 1], got {0}")]
    SpawnChance(f64),
    #[error("{game}: {what} does not fit inside the world")]
    DoesNotFit {
        game: &'static str,
        what: &'static str,
    },
}

fn positive(game: &'static str, field: &'static str, ok: bool) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { game, field })
    }
}

/// Reject NaN and infinities (JSON numbers beyond f32 range parse as infinity)
fn finite(game: &'static str, fields: &[(&'static str, f32)]) -> Result<(), ConfigError> {
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some(&(field, _)) => Err(ConfigError::NotFinite { game, field }),
        None => Ok(()),
    }
}

fn cadence_ok(cadence: Cadence) -> bool {
    !matches!(cadence, Cadence::Every(0))
}

/// Grid snake tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeTuning {
    /// Grid size in cells
    pub grid: IVec2,
    /// Pixel size of one cell (for renderers)
    pub cell_px: u32,
    pub cadence: Cadence,
    /// Head first
    pub start_body: Vec<IVec2>,
    pub start_heading: Heading,
    pub food_points: u64,
}

impl Default for SnakeTuning {
    fn default() -> Self {
        Self {
            grid: IVec2::new(30, 20), // 600x400 canvas at 20 px cells
            cell_px: 20,
            cadence: Cadence::Every(120),
            start_body: vec![IVec2::new(10, 10), IVec2::new(9, 10), IVec2::new(8, 10)],
            start_heading: Heading::Right,
            food_points: 10,
        }
    }
}

impl SnakeTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("snake", "grid", self.grid.x > 0 && self.grid.y > 0)?;
        positive("snake", "cadence", cadence_ok(self.cadence))?;

        let inside = self
            .start_body
            .iter()
            .all(|c| crate::sim::collision::cell_in_grid(*c, self.grid));
        let contiguous = self
            .start_body
            .windows(2)
            .all(|w| (w[0] - w[1]).abs().element_sum() == 1);
        let distinct = self
            .start_body
            .iter()
            .enumerate()
            .all(|(i, c)| !self.start_body[..i].contains(c));
        if self.start_body.is_empty() || !inside || !contiguous || !distinct {
            return Err(ConfigError::BadStartBody);
        }
        // The neck must not sit straight ahead of the head
        if let [head, neck, ..] = self.start_body.as_slice() {
            if *head + self.start_heading.delta() == *neck {
                return Err(ConfigError::BadStartBody);
            }
        }
        Ok(())
    }
}

/// Side-scroller tuning (pixels, seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlappyTuning {
    pub world: Vec2,
    /// Bird x as a fraction of world width
    pub bird_x_ratio: f32,
    pub bird_size: f32,
    pub start_y: f32,
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Vertical velocity set by a flap (px/s, negative is up)
    pub flap_velocity: f32,
    pub pipe_width: f32,
    /// Traversable gap between the two halves of a pair
    pub pipe_gap: f32,
    /// Gap top is drawn from `[gap_min_top, gap_max_top)`
    pub gap_min_top: f32,
    pub gap_max_top: f32,
    /// Horizontal pipe speed (px/s)
    pub pipe_speed: f32,
    pub cadence: Cadence,
    pub spawn_cadence: Cadence,
}

impl Default for FlappyTuning {
    fn default() -> Self {
        // Source ran at 60 ms steps: 2 px/step² gravity, -10 px/step flap,
        // 5 px/step pipes. Converted to per-second units.
        Self {
            world: Vec2::new(800.0, 600.0),
            bird_x_ratio: 0.2,
            bird_size: 40.0,
            start_y: 250.0,
            gravity: 555.0,
            flap_velocity: -166.0,
            pipe_width: 60.0,
            pipe_gap: 150.0,
            gap_min_top: 50.0,
            gap_max_top: 250.0,
            pipe_speed: 83.0,
            cadence: Cadence::Frame,
            spawn_cadence: Cadence::Every(2000),
        }
    }
}

impl FlappyTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        const G: &str = "flappy";
        finite(
            G,
            &[
                ("world", self.world.x),
                ("world", self.world.y),
                ("bird_x_ratio", self.bird_x_ratio),
                ("bird_size", self.bird_size),
                ("start_y", self.start_y),
                ("gravity", self.gravity),
                ("flap_velocity", self.flap_velocity),
                ("pipe_width", self.pipe_width),
                ("pipe_gap", self.pipe_gap),
                ("gap band", self.gap_min_top),
                ("gap band", self.gap_max_top),
                ("pipe_speed", self.pipe_speed),
            ],
        )?;
        positive(G, "world", self.world.x > 0.0 && self.world.y > 0.0)?;
        positive(G, "bird_size", self.bird_size > 0.0)?;
        positive(G, "gravity", self.gravity > 0.0)?;
        positive(G, "pipe_width", self.pipe_width > 0.0)?;
        positive(G, "pipe_speed", self.pipe_speed > 0.0)?;
        positive(G, "cadence", cadence_ok(self.cadence))?;
        positive(G, "spawn_cadence", cadence_ok(self.spawn_cadence))?;

        if self.pipe_gap <= self.bird_size || self.gap_max_top + self.pipe_gap > self.world.y {
            return Err(ConfigError::GapTooSmall {
                gap: self.pipe_gap,
                bird: self.bird_size,
                height: self.world.y,
            });
        }
        if self.gap_min_top < 0.0 || self.gap_min_top >= self.gap_max_top {
            return Err(ConfigError::DoesNotFit { game: G, what: "gap band" });
        }
        if self.start_y < 0.0 || self.start_y + self.bird_size > self.world.y {
            return Err(ConfigError::DoesNotFit { game: G, what: "bird start" });
        }
        Ok(())
    }
}

/// Lane racer tuning (pixels; obstacle speeds in px/s)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RacerTuning {
    pub track: Vec2,
    pub car_start: Vec2,
    pub car_size: Vec2,
    /// Horizontal step per steering input
    pub steer_step: f32,
    pub throttle_step: f32,
    pub max_speed: f32,
    pub obstacle_size: f32,
    pub obstacle_speed_min: f32,
    pub obstacle_speed_spread: f32,
    /// Per-tick spawn probability
    pub spawn_chance: f64,
    pub cadence: Cadence,
}

impl Default for RacerTuning {
    fn default() -> Self {
        Self {
            track: Vec2::new(900.0, 400.0),
            car_start: Vec2::new(200.0, 300.0),
            car_size: Vec2::new(60.0, 100.0),
            steer_step: 10.0,
            throttle_step: 0.5,
            max_speed: 15.0,
            obstacle_size: 50.0,
            // 5-8 px per frame at 60 Hz
            obstacle_speed_min: 300.0,
            obstacle_speed_spread: 180.0,
            spawn_chance: 0.02,
            cadence: Cadence::Frame,
        }
    }
}

impl RacerTuning {
    pub fn validate(&self) -> Result<(), ConfigError> {
        const G: &str = "racer";
        finite(
            G,
            &[
                ("track", self.track.x),
                ("track", self.track.y),
                ("car_start", self.car_start.x),
                ("car_start", self.car_start.y),
                ("car_size", self.car_size.x),
                ("car_size", self.car_size.y),
                ("steer_step", self.steer_step),
                ("throttle_step", self.throttle_step),
                ("max_speed", self.max_speed),
                ("obstacle_size", self.obstacle_size),
                ("obstacle_speed_min", self.obstacle_speed_min),
                ("obstacle_speed_spread", self.obstacle_speed_spread),
            ],
        )?;
        positive(G, "track", self.track.x > 0.0 && self.track.y > 0.0)?;
        positive(G, "car_size", self.car_size.x > 0.0 && self.car_size.y > 0.0)?;
        positive(G, "obstacle_size", self.obstacle_size > 0.0)?;
        positive(G, "obstacle_speed_min", self.obstacle_speed_min > 0.0)?;
        positive(G, "max_speed", self.max_speed > 0.0)?;
        positive(G, "cadence", cadence_ok(self.cadence))?;

        if !(0.0..=1.0).contains(&self.spawn_chance) {
            return Err(ConfigError::SpawnChance(self.spawn_chance));
        }
        if self.obstacle_speed_spread < 0.0 {
            return Err(ConfigError::NotPositive { game: G, field: "obstacle_speed_spread" });
        }
        if self.obstacle_size >= self.track.x {
            return Err(ConfigError::DoesNotFit { game: G, what: "obstacle" });
        }
        let car_end = self.car_start + self.car_size;
        if self.car_start.min_element() < 0.0 || car_end.x > self.track.x || car_end.y > self.track.y {
            return Err(ConfigError::DoesNotFit { game: G, what: "car" });
        }
        Ok(())
    }
}

/// Tuning for every game in the arcade
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    pub snake: SnakeTuning,
    pub flappy: FlappyTuning,
    pub racer: RacerTuning,
}

impl ArcadeConfig {
    /// Parse overrides from JSON and validate the result
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        log::info!("Loaded arcade config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.snake.validate()?;
        self.flappy.validate()?;
        self.racer.validate()
    }
}
