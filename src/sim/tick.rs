//! Fixed timestep simulation tick
//!
//! Every game runs through the same five stages per tick:
//! apply pending intent → advance entities → spawn → detect collisions →
//! settle score. The [`Engine`] owns the run lifecycle around that tick:
//! the phase machine, the scheduler's timers, scoring, and snapshots.

use rand_pcg::Pcg32;

use super::collision::{Collision, CrashCause};
use super::state::{GameEvent, GamePhase, RngState, Snapshot, WorldView};
use crate::platform::{Cadence, InputEvent, IntentSlot, Scheduler, TimerRole};
use crate::settings::GameKind;

/// One game's rules, plugged into the shared tick
///
/// Every method must be total: ticks never fail.
pub trait Simulation {
    /// Player intent recorded between ticks
    type Intent: Copy + std::fmt::Debug;

    fn kind(&self) -> GameKind;

    /// Cadence of the main tick
    fn cadence(&self) -> Cadence;

    /// Cadence of a separate spawn timer, if the game has one
    fn spawn_cadence(&self) -> Option<Cadence> {
        None
    }

    /// Put every entity back to its starting layout
    fn reset(&mut self, rng: &mut Pcg32);

    /// Translate a raw event into intent, or reject it
    fn intent_for(&self, event: &InputEvent) -> Option<Self::Intent>;

    fn apply_intent(&mut self, intent: Self::Intent);

    /// Integrate movement by one step of `dt` seconds
    fn advance(&mut self, dt: f32);

    /// Place new entities and prune stale ones; `cycle_due` is set when the
    /// spawn timer fired since the previous tick
    fn spawn(&mut self, rng: &mut Pcg32, cycle_due: bool, events: &mut Vec<GameEvent>);

    fn detect_collision(&self) -> Collision;

    /// Consume the non-fatal contacts and return the points earned this tick
    fn settle(&mut self, collision: &Collision, rng: &mut Pcg32, events: &mut Vec<GameEvent>) -> u64;

    fn view(&self) -> WorldView;
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not running; nothing changed
    Skipped,
    Continued { points: u64 },
    Crashed(CrashCause),
}

/// Host-facing controls, object safe so any game fits `Box<dyn ArcadeGame>`
pub trait ArcadeGame {
    fn kind(&self) -> GameKind;
    fn phase(&self) -> GamePhase;
    fn score(&self) -> u64;
    fn best_score(&self) -> u64;
    /// Seed the session best (carried across mounts)
    fn set_best_score(&mut self, best: u64);
    fn start(&mut self);
    fn restart(&mut self);
    fn handle_input(&mut self, event: &InputEvent);
    /// Feed elapsed wall-clock time; returns how many ticks ran
    fn advance(&mut self, elapsed_ms: f64) -> usize;
    /// Force a single tick regardless of timers
    fn tick(&mut self) -> TickOutcome;
    fn stop(&mut self);
    fn teardown(&mut self);
    fn active_timers(&self) -> usize;
    fn snapshot(&self) -> Snapshot;
    fn drain_events(&mut self) -> Vec<GameEvent>;
}

/// Drives one [`Simulation`] through its runs
pub struct Engine<S: Simulation> {
    sim: S,
    phase: GamePhase,
    score: u64,
    best: u64,
    pending: IntentSlot<S::Intent>,
    spawn_due: bool,
    rng_state: RngState,
    rng: Pcg32,
    scheduler: Scheduler,
    dt: f32,
    time_ticks: u64,
    run: u64,
    events: Vec<GameEvent>,
}

impl<S: Simulation> Engine<S> {
    /// Create an idle engine; entities are laid out but nothing runs
    pub fn new(mut sim: S, seed: u64) -> Self {
        let rng_state = RngState::new(seed);
        let mut rng = rng_state.to_rng();
        sim.reset(&mut rng);
        let dt = sim.cadence().step_secs();
        Self {
            sim,
            phase: GamePhase::Idle,
            score: 0,
            best: 0,
            pending: IntentSlot::default(),
            spawn_due: false,
            rng_state,
            rng,
            scheduler: Scheduler::new(),
            dt,
            time_ticks: 0,
            run: 0,
            events: Vec::new(),
        }
    }

    pub fn sim(&self) -> &S {
        &self.sim
    }

    #[cfg(test)]
    pub(crate) fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Begin a fresh run. Safe to call in any phase: existing timers are
    /// torn down before new ones are registered.
    pub fn start(&mut self) {
        self.scheduler.stop();
        if self.phase == GamePhase::Running {
            log::debug!("{} restarted mid-run", self.sim.kind().as_str());
        }

        self.rng = self.rng_state.next_run();
        self.sim.reset(&mut self.rng);
        self.score = 0;
        self.pending.clear();
        self.spawn_due = false;
        self.time_ticks = 0;
        self.run += 1;

        self.dt = self.sim.cadence().step_secs();
        self.scheduler.start(TimerRole::Step, self.sim.cadence());
        if let Some(cadence) = self.sim.spawn_cadence() {
            self.scheduler.start(TimerRole::Spawn, cadence);
        }

        self.phase = GamePhase::Running;
        self.events.push(GameEvent::RunStarted { run: self.run });
        log::info!("{} run {} started", self.sim.kind().as_str(), self.run);
    }

    pub fn restart(&mut self) {
        self.start();
    }

    /// Record intent for the next tick; ignored unless running
    pub fn handle_input(&mut self, event: &InputEvent) {
        if self.phase != GamePhase::Running {
            log::trace!("Ignoring {:?} while {:?}", event, self.phase);
            return;
        }
        match self.sim.intent_for(event) {
            Some(intent) => self.pending.record(intent),
            None => log::debug!("Rejected {:?}", event),
        }
    }

    /// Run the ticks and spawn cycles that fell due in `elapsed_ms`
    pub fn advance(&mut self, elapsed_ms: f64) -> usize {
        if self.phase != GamePhase::Running {
            return 0;
        }
        let fires = self.scheduler.advance(elapsed_ms);
        let mut ticks = 0;
        for fire in fires {
            // A crash mid-batch stops the scheduler; later fires are stale
            if !self.scheduler.is_live(&fire) {
                continue;
            }
            match fire.role {
                TimerRole::Step => {
                    self.tick();
                    ticks += 1;
                }
                TimerRole::Spawn => self.spawn_due = true,
            }
        }
        ticks
    }

    /// Advance the simulation by one fixed step
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != GamePhase::Running {
            return TickOutcome::Skipped;
        }
        self.time_ticks += 1;

        if let Some(intent) = self.pending.take() {
            self.sim.apply_intent(intent);
        }
        self.sim.advance(self.dt);

        let cycle_due = std::mem::take(&mut self.spawn_due);
        self.sim.spawn(&mut self.rng, cycle_due, &mut self.events);

        let collision = self.sim.detect_collision();
        if let Some(cause) = collision.fatal {
            self.game_over(cause);
            return TickOutcome::Crashed(cause);
        }

        let points = self.sim.settle(&collision, &mut self.rng, &mut self.events);
        if points > 0 {
            self.score = self.score.saturating_add(points);
            self.events.push(GameEvent::Scored {
                points,
                total: self.score,
            });
        }
        TickOutcome::Continued { points }
    }

    fn game_over(&mut self, cause: CrashCause) {
        self.scheduler.stop();
        self.pending.clear();
        self.spawn_due = false;
        self.phase = GamePhase::GameOver;
        if self.score > self.best {
            self.best = self.score;
        }
        self.events.push(GameEvent::Crashed {
            cause,
            score: self.score,
            tick: self.time_ticks,
        });
        log::info!(
            "{} run {} over: {:?} at tick {}, score {} (best {})",
            self.sim.kind().as_str(),
            self.run,
            cause,
            self.time_ticks,
            self.score,
            self.best
        );
    }

    /// Cancel every timer. A run in progress is abandoned.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.pending.clear();
        self.spawn_due = false;
        if self.phase == GamePhase::Running {
            self.phase = GamePhase::Idle;
            self.events.push(GameEvent::RunAbandoned { score: self.score });
            log::info!("{} run {} abandoned", self.sim.kind().as_str(), self.run);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            kind: self.sim.kind(),
            phase: self.phase,
            score: self.score,
            best: self.best,
            is_over: self.phase == GamePhase::GameOver,
            tick: self.time_ticks,
            world: self.sim.view(),
        }
    }
}

impl<S: Simulation> ArcadeGame for Engine<S> {
    fn kind(&self) -> GameKind {
        self.sim.kind()
    }

    fn phase(&self) -> GamePhase {
        self.phase
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn best_score(&self) -> u64 {
        self.best
    }

    fn set_best_score(&mut self, best: u64) {
        self.best = self.best.max(best);
    }

    fn start(&mut self) {
        Engine::start(self);
    }

    fn restart(&mut self) {
        Engine::restart(self);
    }

    fn handle_input(&mut self, event: &InputEvent) {
        Engine::handle_input(self, event);
    }

    fn advance(&mut self, elapsed_ms: f64) -> usize {
        Engine::advance(self, elapsed_ms)
    }

    fn tick(&mut self) -> TickOutcome {
        Engine::tick(self)
    }

    fn stop(&mut self) {
        Engine::stop(self);
    }

    fn teardown(&mut self) {
        Engine::stop(self);
    }

    fn active_timers(&self) -> usize {
        self.scheduler.active_timers()
    }

    fn snapshot(&self) -> Snapshot {
        Engine::snapshot(self)
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Key;
    use crate::settings::{FlappyTuning, RacerTuning, SnakeTuning};
    use crate::sim::flappy::Flappy;
    use crate::sim::racer::Racer;
    use crate::sim::snake::Snake;
    use proptest::prelude::*;

    fn snake_engine(seed: u64) -> Engine<Snake> {
        Engine::new(Snake::new(SnakeTuning::default()), seed)
    }

    #[test]
    fn test_idle_until_started() {
        let mut engine = snake_engine(1);
        assert_eq!(engine.snapshot().phase, GamePhase::Idle);
        assert_eq!(engine.tick(), TickOutcome::Skipped);
        assert_eq!(engine.advance(1000.0), 0);
        assert_eq!(engine.time_ticks(), 0);

        engine.start();
        assert_eq!(engine.snapshot().phase, GamePhase::Running);
        assert_eq!(engine.advance(120.0), 1);
    }

    #[test]
    fn test_input_ignored_when_not_running() {
        let mut engine = snake_engine(1);
        engine.handle_input(&InputEvent::KeyDown(Key::Down));
        assert_eq!(engine.pending.peek(), None);

        engine.start();
        engine.handle_input(&InputEvent::KeyDown(Key::Down));
        assert!(engine.pending.peek().is_some());
    }

    #[test]
    fn test_double_start_keeps_one_set_of_timers() {
        let mut engine = Engine::new(Flappy::new(FlappyTuning::default()), 3);
        engine.start();
        engine.start();
        assert_eq!(ArcadeGame::active_timers(&engine), 2);
        // One frame, one tick
        assert_eq!(engine.advance(16.0), 1);
    }

    #[test]
    fn test_stop_tears_down_everything() {
        let mut engine = Engine::new(Flappy::new(FlappyTuning::default()), 3);
        engine.start();
        engine.handle_input(&InputEvent::Pointer);
        engine.stop();
        engine.stop();

        assert_eq!(ArcadeGame::active_timers(&engine), 0);
        assert_eq!(engine.snapshot().phase, GamePhase::Idle);
        assert_eq!(engine.advance(16.0), 0);
        let events = ArcadeGame::drain_events(&mut engine);
        assert!(events.contains(&GameEvent::RunAbandoned { score: 0 }));
    }

    #[test]
    fn test_crash_mid_batch_drops_remaining_fires() {
        let mut engine = snake_engine(5);
        engine.start();
        // Head at (10,10) heading right: the wall at x=30 is 20 steps away,
        // so batches past that point must stop exactly at the crash.
        let mut ticks = 0;
        for _ in 0..15 {
            ticks += engine.advance(240.0);
        }
        assert_eq!(engine.snapshot().phase, GamePhase::GameOver);
        assert_eq!(ticks, 20);
        assert_eq!(engine.time_ticks(), 20);
        assert_eq!(ArcadeGame::active_timers(&engine), 0);
    }

    #[test]
    fn test_restart_resets_score() {
        let mut engine = snake_engine(9);
        engine.start();
        let head = engine.sim().body()[0];
        engine.sim_mut().place_food_at(head + glam::IVec2::X);
        engine.tick();
        assert_eq!(engine.snapshot().score, 10);

        engine.sim_mut().force_heading(crate::sim::geom::Heading::Up);
        while engine.tick() != TickOutcome::Skipped {}
        let over = engine.snapshot();
        assert!(over.is_over);
        assert!(over.score >= 10);
        assert_eq!(over.best, over.score);

        engine.restart();
        let fresh = engine.snapshot();
        assert_eq!(fresh.score, 0);
        assert_eq!(fresh.best, over.best);
        assert!(!fresh.is_over);
    }

    #[test]
    fn test_gameover_is_frozen() {
        let mut engine = Engine::new(Racer::new(RacerTuning::default()), 4);
        engine.start();
        let car = engine.sim().car_rect();
        engine.sim_mut().push_obstacle(car.pos, car.size.x, 0.0);
        assert!(matches!(engine.tick(), TickOutcome::Crashed(CrashCause::Obstacle)));

        let frozen = engine.snapshot();
        engine.handle_input(&InputEvent::KeyDown(Key::Left));
        assert_eq!(engine.tick(), TickOutcome::Skipped);
        assert_eq!(engine.advance(100.0), 0);
        assert_eq!(engine.snapshot(), frozen);
    }

    #[test]
    fn test_same_seed_same_run() {
        let inputs = [Key::Up, Key::Left, Key::Down, Key::Right];
        let run = |seed: u64| {
            let mut engine = Engine::new(Racer::new(RacerTuning::default()), seed);
            engine.start();
            for i in 0..300 {
                engine.handle_input(&InputEvent::KeyDown(inputs[i % inputs.len()]));
                engine.advance(16.0);
            }
            engine.snapshot()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_events_drained() {
        let mut engine = snake_engine(2);
        engine.start();
        let events = ArcadeGame::drain_events(&mut engine);
        assert_eq!(events[0], GameEvent::RunStarted { run: 1 });
        assert!(ArcadeGame::drain_events(&mut engine).is_empty());
    }

    proptest! {
        #[test]
        fn prop_score_never_decreases(seed in any::<u64>(), keys in proptest::collection::vec(0usize..4, 1..200)) {
            let all = [Key::Up, Key::Down, Key::Left, Key::Right];
            let mut engine = Engine::new(Racer::new(RacerTuning::default()), seed);
            engine.start();
            let mut last = 0;
            for k in keys {
                engine.handle_input(&InputEvent::KeyDown(all[k]));
                engine.tick();
                let score = engine.snapshot().score;
                prop_assert!(score >= last);
                last = score;
            }
            engine.restart();
            prop_assert_eq!(engine.snapshot().score, 0);
        }
    }
}
