//! Side-scrolling flappy game
//!
//! The bird falls under gravity and a flap sets an upward velocity. Pipe
//! pairs scroll left at a constant speed; a new pair arrives on every spawn
//! cycle. Passing a pair scores one point.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Collision, CrashCause, outside_vertical_band, rect_hits_any};
use super::geom::Rect;
use super::state::{GameEvent, WorldView};
use super::tick::Simulation;
use crate::platform::{Cadence, InputEvent, Key};
use crate::settings::{FlappyTuning, GameKind};

/// A pipe pair: a top half down to `gap_top` and a bottom half from
/// `gap_bottom` to the floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    pub x: f32,
    pub width: f32,
    pub gap_top: f32,
    pub gap_bottom: f32,
    /// Already scored
    pub passed: bool,
}

impl Pipe {
    pub fn top_rect(&self) -> Rect {
        Rect::new(self.x, 0.0, self.width, self.gap_top)
    }

    pub fn bottom_rect(&self, world_height: f32) -> Rect {
        Rect::new(self.x, self.gap_bottom, self.width, world_height - self.gap_bottom)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Append a pipe pair at the right edge with a random gap position
pub fn spawn_pipe<R: Rng + ?Sized>(rng: &mut R, tuning: &FlappyTuning) -> Pipe {
    let gap_top = rng.random_range(tuning.gap_min_top..tuning.gap_max_top);
    Pipe {
        x: tuning.world.x,
        width: tuning.pipe_width,
        gap_top,
        gap_bottom: gap_top + tuning.pipe_gap,
        passed: false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlapIntent {
    Flap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlappyView {
    pub world: Vec2,
    pub bird: Rect,
    pub velocity: f32,
    pub pipes: Vec<Pipe>,
}

pub struct Flappy {
    tuning: FlappyTuning,
    bird_y: f32,
    velocity: f32,
    pipes: Vec<Pipe>,
}

impl Flappy {
    pub fn new(tuning: FlappyTuning) -> Self {
        let bird_y = tuning.start_y;
        Self {
            tuning,
            bird_y,
            velocity: 0.0,
            pipes: Vec::new(),
        }
    }

    pub fn bird_rect(&self) -> Rect {
        let size = self.tuning.bird_size;
        Rect::new(self.tuning.world.x * self.tuning.bird_x_ratio, self.bird_y, size, size)
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    #[cfg(test)]
    pub(crate) fn push_pipe(&mut self, pipe: Pipe) {
        self.pipes.push(pipe);
    }

    #[cfg(test)]
    pub(crate) fn set_bird(&mut self, y: f32, velocity: f32) {
        self.bird_y = y;
        self.velocity = velocity;
    }
}

impl Simulation for Flappy {
    type Intent = FlapIntent;

    fn kind(&self) -> GameKind {
        GameKind::Flappy
    }

    fn cadence(&self) -> Cadence {
        self.tuning.cadence
    }

    fn spawn_cadence(&self) -> Option<Cadence> {
        Some(self.tuning.spawn_cadence)
    }

    fn reset(&mut self, _rng: &mut Pcg32) {
        self.bird_y = self.tuning.start_y;
        self.velocity = 0.0;
        self.pipes.clear();
    }

    fn intent_for(&self, event: &InputEvent) -> Option<FlapIntent> {
        match event {
            InputEvent::Pointer | InputEvent::KeyDown(Key::Space | Key::Up) => Some(FlapIntent::Flap),
            _ => None,
        }
    }

    fn apply_intent(&mut self, intent: FlapIntent) {
        match intent {
            FlapIntent::Flap => self.velocity = self.tuning.flap_velocity,
        }
    }

    fn advance(&mut self, dt: f32) {
        // Semi-implicit Euler: velocity first, so a resting bird drops on
        // the very first tick
        self.velocity += self.tuning.gravity * dt;
        self.bird_y += self.velocity * dt;

        let shift = self.tuning.pipe_speed * dt;
        for pipe in &mut self.pipes {
            pipe.x -= shift;
        }
    }

    fn spawn(&mut self, rng: &mut Pcg32, cycle_due: bool, events: &mut Vec<GameEvent>) {
        if !cycle_due {
            return;
        }
        let before = self.pipes.len();
        self.pipes.retain(|p| p.right() > 0.0);
        let pruned = before - self.pipes.len();
        if pruned > 0 {
            events.push(GameEvent::Pruned { count: pruned });
        }

        let pipe = spawn_pipe(rng, &self.tuning);
        log::debug!("Pipe spawned, gap {:.0}..{:.0}", pipe.gap_top, pipe.gap_bottom);
        self.pipes.push(pipe);
        events.push(GameEvent::Spawned);
    }

    fn detect_collision(&self) -> Collision {
        let bird = self.bird_rect();
        let height = self.tuning.world.y;
        if outside_vertical_band(&bird, height) {
            return Collision::fatal(CrashCause::OutOfBounds);
        }

        let mut collision = Collision::clear();
        for (i, pipe) in self.pipes.iter().enumerate() {
            if rect_hits_any(&bird, [&pipe.top_rect(), &pipe.bottom_rect(height)]) {
                return Collision::fatal(CrashCause::Obstacle);
            }
            // Threshold crossing: the pair's trailing edge is behind the bird
            if !pipe.passed && pipe.right() < bird.left() {
                collision.contacts.push(i);
            }
        }
        collision
    }

    fn settle(&mut self, collision: &Collision, _rng: &mut Pcg32, _events: &mut Vec<GameEvent>) -> u64 {
        let mut points = 0;
        for &i in &collision.contacts {
            if let Some(pipe) = self.pipes.get_mut(i) {
                pipe.passed = true;
                points += 1;
            }
        }
        points
    }

    fn view(&self) -> WorldView {
        WorldView::Flappy(FlappyView {
            world: self.tuning.world,
            bird: self.bird_rect(),
            velocity: self.velocity,
            pipes: self.pipes.clone(),
        })
    }
}
