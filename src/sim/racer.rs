//! Vertically scrolling lane racer
//!
//! The car stays at a fixed height and steps sideways on input. Its speed
//! only sets how fast distance (score) accrues; obstacles fall down the
//! track at their own speed.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Collision, CrashCause, rect_hits_any};
use super::geom::Rect;
use super::state::{GameEvent, WorldView};
use super::tick::Simulation;
use crate::platform::{Cadence, InputEvent, Key};
use crate::settings::{GameKind, RacerTuning};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub rect: Rect,
    /// Fall speed (px/s)
    pub speed: f32,
}

/// Roll for a new obstacle at the top of the track
pub fn spawn_obstacle<R: Rng + ?Sized>(rng: &mut R, tuning: &RacerTuning) -> Option<Obstacle> {
    if !rng.random_bool(tuning.spawn_chance) {
        return None;
    }
    let size = tuning.obstacle_size;
    let x = rng.random_range(0.0..tuning.track.x - size);
    let speed = tuning.obstacle_speed_min + rng.random::<f32>() * tuning.obstacle_speed_spread;
    Some(Obstacle {
        rect: Rect::new(x, -size, size, size),
        speed,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacerIntent {
    SteerLeft,
    SteerRight,
    Accelerate,
    Brake,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacerView {
    pub track: Vec2,
    pub car: Rect,
    pub speed: f32,
    pub obstacles: Vec<Rect>,
}

pub struct Racer {
    tuning: RacerTuning,
    car: Vec2,
    speed: f32,
    obstacles: Vec<Obstacle>,
}

impl Racer {
    pub fn new(tuning: RacerTuning) -> Self {
        let car = tuning.car_start;
        Self {
            tuning,
            car,
            speed: 0.0,
            obstacles: Vec::new(),
        }
    }

    pub fn car_rect(&self) -> Rect {
        Rect::from_pos_size(self.car, self.tuning.car_size)
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    #[cfg(test)]
    pub(crate) fn push_obstacle(&mut self, pos: Vec2, size: f32, speed: f32) {
        self.obstacles.push(Obstacle {
            rect: Rect::from_pos_size(pos, Vec2::splat(size)),
            speed,
        });
    }

    #[cfg(test)]
    pub(crate) fn place_car(&mut self, pos: Vec2) {
        self.car = pos;
    }
}

impl Simulation for Racer {
    type Intent = RacerIntent;

    fn kind(&self) -> GameKind {
        GameKind::Racer
    }

    fn cadence(&self) -> Cadence {
        self.tuning.cadence
    }

    fn reset(&mut self, _rng: &mut Pcg32) {
        self.car = self.tuning.car_start;
        self.speed = 0.0;
        self.obstacles.clear();
    }

    fn intent_for(&self, event: &InputEvent) -> Option<RacerIntent> {
        match event {
            InputEvent::KeyDown(Key::Left) => Some(RacerIntent::SteerLeft),
            InputEvent::KeyDown(Key::Right) => Some(RacerIntent::SteerRight),
            InputEvent::KeyDown(Key::Up) => Some(RacerIntent::Accelerate),
            InputEvent::KeyDown(Key::Down) => Some(RacerIntent::Brake),
            _ => None,
        }
    }

    fn apply_intent(&mut self, intent: RacerIntent) {
        let t = &self.tuning;
        let max_x = t.track.x - t.car_size.x;
        match intent {
            RacerIntent::SteerLeft => self.car.x = (self.car.x - t.steer_step).clamp(0.0, max_x),
            RacerIntent::SteerRight => self.car.x = (self.car.x + t.steer_step).clamp(0.0, max_x),
            RacerIntent::Accelerate => self.speed = (self.speed + t.throttle_step).min(t.max_speed),
            RacerIntent::Brake => self.speed = (self.speed - t.throttle_step).max(0.0),
        }
    }

    fn advance(&mut self, dt: f32) {
        for obstacle in &mut self.obstacles {
            obstacle.rect.pos.y += obstacle.speed * dt;
        }
    }

    fn spawn(&mut self, rng: &mut Pcg32, _cycle_due: bool, events: &mut Vec<GameEvent>) {
        let before = self.obstacles.len();
        let bottom = self.tuning.track.y;
        self.obstacles.retain(|o| o.rect.top() < bottom);
        let pruned = before - self.obstacles.len();
        if pruned > 0 {
            events.push(GameEvent::Pruned { count: pruned });
        }

        if let Some(obstacle) = spawn_obstacle(rng, &self.tuning) {
            self.obstacles.push(obstacle);
            events.push(GameEvent::Spawned);
        }
    }

    fn detect_collision(&self) -> Collision {
        let car = self.car_rect();
        if rect_hits_any(&car, self.obstacles.iter().map(|o| &o.rect)) {
            Collision::fatal(CrashCause::Obstacle)
        } else {
            Collision::clear()
        }
    }

    fn settle(&mut self, _collision: &Collision, _rng: &mut Pcg32, _events: &mut Vec<GameEvent>) -> u64 {
        // Distance covered this tick
        self.speed.floor() as u64
    }

    fn view(&self) -> WorldView {
        WorldView::Racer(RacerView {
            track: self.tuning.track,
            car: self.car_rect(),
            speed: self.speed,
            obstacles: self.obstacles.iter().map(|o| o.rect).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GamePhase;
    use crate::sim::tick::{ArcadeGame, Engine, TickOutcome};
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn quiet_tuning() -> RacerTuning {
        RacerTuning {
            spawn_chance: 0.0,
            ..RacerTuning::default()
        }
    }

    fn running(tuning: RacerTuning) -> Engine<Racer> {
        let mut engine = Engine::new(Racer::new(tuning), 8);
        engine.start();
        engine
    }

    #[test]
    fn test_overlap_ends_run_and_stops_timers() {
        let mut engine = running(quiet_tuning());
        engine.sim_mut().place_car(Vec2::new(120.0, 100.0));
        engine.sim_mut().push_obstacle(Vec2::new(100.0, 90.0), 50.0, 0.0);

        assert_eq!(engine.tick(), TickOutcome::Crashed(CrashCause::Obstacle));
        assert_eq!(engine.snapshot().phase, GamePhase::GameOver);
        assert_eq!(engine.active_timers(), 0);

        let frozen = engine.snapshot();
        for _ in 0..5 {
            assert_eq!(engine.tick(), TickOutcome::Skipped);
        }
        assert_eq!(engine.snapshot(), frozen);
    }

    #[test]
    fn test_steering_clamps_to_track() {
        let mut engine = running(quiet_tuning());
        for _ in 0..40 {
            engine.handle_input(&InputEvent::KeyDown(Key::Left));
            engine.tick();
        }
        assert_eq!(engine.sim().car_rect().left(), 0.0);

        let tuning = quiet_tuning();
        for _ in 0..200 {
            engine.handle_input(&InputEvent::KeyDown(Key::Right));
            engine.tick();
        }
        assert_eq!(engine.sim().car_rect().right(), tuning.track.x);
    }

    #[test]
    fn test_speed_clamps_and_scores() {
        let mut engine = running(quiet_tuning());
        engine.handle_input(&InputEvent::KeyDown(Key::Down));
        engine.tick();
        assert_eq!(engine.sim().speed(), 0.0);

        for _ in 0..40 {
            engine.handle_input(&InputEvent::KeyDown(Key::Up));
            engine.tick();
        }
        assert_eq!(engine.sim().speed(), 15.0);
        assert_eq!(engine.tick(), TickOutcome::Continued { points: 15 });
        // Speed never moves the car
        assert_eq!(engine.sim().car_rect().top(), 300.0);
    }

    #[test]
    fn test_obstacles_fall_and_are_pruned() {
        let mut engine = running(quiet_tuning());
        engine.sim_mut().place_car(Vec2::new(800.0, 300.0));
        engine.sim_mut().push_obstacle(Vec2::new(0.0, 350.0), 50.0, 600.0);

        engine.tick();
        assert!((engine.sim().obstacles()[0].rect.top() - 360.0).abs() < 1e-3);
        for _ in 0..5 {
            engine.tick();
        }
        assert!(engine.sim().obstacles().is_empty());
        let events = engine.drain_events();
        assert!(events.contains(&GameEvent::Pruned { count: 1 }));
    }

    #[test]
    fn test_random_spawns_stay_on_track() {
        let tuning = RacerTuning {
            spawn_chance: 1.0,
            ..RacerTuning::default()
        };
        let mut engine = running(tuning.clone());
        engine.sim_mut().place_car(Vec2::new(0.0, 300.0));
        engine.tick();
        // Spawned above the car's reach, so no crash yet
        let spawned = engine.sim().obstacles();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].rect.top(), -tuning.obstacle_size);
    }

    proptest! {
        #[test]
        fn prop_spawn_within_bounds(seed in any::<u64>()) {
            let tuning = RacerTuning { spawn_chance: 1.0, ..RacerTuning::default() };
            let mut rng = Pcg32::seed_from_u64(seed);
            let obstacle = spawn_obstacle(&mut rng, &tuning).unwrap();
            prop_assert!(obstacle.rect.left() >= 0.0);
            prop_assert!(obstacle.rect.right() <= tuning.track.x);
            prop_assert!(obstacle.speed >= tuning.obstacle_speed_min);
            prop_assert!(obstacle.speed <= tuning.obstacle_speed_min + tuning.obstacle_speed_spread);
        }
    }
}
