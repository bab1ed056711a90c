//! Arcade host
//!
//! Mounts one game at a time behind `Box<dyn ArcadeGame>`. Mounting a new
//! game tears the previous one down first, so at most one set of timers is
//! ever registered. Finished runs feed the session leaderboard, and each
//! mount starts with the best score recorded so far for its game.

use crate::highscores::HighScores;
use crate::platform::{InputEvent, Key};
use crate::settings::{ArcadeConfig, ConfigError, GameKind};
use crate::sim::{ArcadeGame, Engine, Flappy, GameEvent, GamePhase, Racer, Snake, Snapshot};

pub struct Arcade {
    config: ArcadeConfig,
    seed: u64,
    mounts: u64,
    active: Option<Box<dyn ArcadeGame>>,
    /// Run number of the active game's current run
    run: u64,
    scores: HighScores,
}

impl Arcade {
    pub fn new(config: ArcadeConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            seed,
            mounts: 0,
            active: None,
            run: 0,
            scores: HighScores::new(),
        })
    }

    fn build(&self, kind: GameKind, seed: u64) -> Box<dyn ArcadeGame> {
        match kind {
            GameKind::Snake => Box::new(Engine::new(Snake::new(self.config.snake.clone()), seed)),
            GameKind::Flappy => Box::new(Engine::new(Flappy::new(self.config.flappy.clone()), seed)),
            GameKind::Racer => Box::new(Engine::new(Racer::new(self.config.racer.clone()), seed)),
        }
    }

    /// Replace the active game with a fresh, idle `kind`
    pub fn mount(&mut self, kind: GameKind) {
        self.unmount();
        self.mounts += 1;
        // Each mount gets its own seed so remounting doesn't replay the same runs
        let seed = self.seed.wrapping_add(self.mounts.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut game = self.build(kind, seed);
        game.set_best_score(self.scores.best(kind));
        self.run = 0;
        self.active = Some(game);
        log::info!("Mounted {} (seed {})", kind.as_str(), seed);
    }

    /// Tear down the active game; no timers remain afterwards
    pub fn unmount(&mut self) {
        if let Some(mut game) = self.active.take() {
            game.teardown();
            let kind = game.kind();
            let events = game.drain_events();
            self.record(kind, &events);
            log::info!("Unmounted {}", kind.as_str());
        }
    }

    pub fn active(&self) -> Option<GameKind> {
        self.active.as_ref().map(|g| g.kind())
    }

    pub fn phase(&self) -> Option<GamePhase> {
        self.active.as_ref().map(|g| g.phase())
    }

    /// Start (or restart) the active game; false if nothing is mounted
    pub fn start(&mut self) -> bool {
        match self.active.as_mut() {
            Some(game) => {
                game.start();
                true
            }
            None => false,
        }
    }

    /// Route input to the active game. Enter starts a game that isn't
    /// running, as does a pointer press on flappy (playable with a pointer
    /// alone); everything else is game intent.
    pub fn handle_input(&mut self, event: &InputEvent) {
        let Some(game) = self.active.as_mut() else {
            return;
        };
        let starts = match event {
            InputEvent::KeyDown(Key::Enter) => true,
            InputEvent::Pointer => game.kind() == GameKind::Flappy,
            _ => false,
        };
        if starts && game.phase() != GamePhase::Running {
            game.start();
            return;
        }
        game.handle_input(event);
    }

    /// Feed elapsed host time and collect what happened
    pub fn advance(&mut self, elapsed_ms: f64) -> Vec<GameEvent> {
        let Some(game) = self.active.as_mut() else {
            return Vec::new();
        };
        game.advance(elapsed_ms);
        let kind = game.kind();
        let events = game.drain_events();
        self.record(kind, &events);
        events
    }

    fn record(&mut self, kind: GameKind, events: &[GameEvent]) {
        for event in events {
            match *event {
                GameEvent::RunStarted { run } => self.run = run,
                GameEvent::Crashed { score, tick, .. } => {
                    self.scores.add_score(kind, score, tick, self.run);
                }
                _ => {}
            }
        }
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.active.as_ref().map(|g| g.snapshot())
    }

    pub fn active_timers(&self) -> usize {
        self.active.as_ref().map(|g| g.active_timers()).unwrap_or(0)
    }

    /// Leaderboard rank the active run's score would take if it ended now
    pub fn live_rank(&self) -> Option<usize> {
        let game = self.active.as_ref()?;
        self.scores.potential_rank(game.kind(), game.score())
    }

    pub fn scores(&self) -> &HighScores {
        &self.scores
    }
}

impl Drop for Arcade {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use crate::settings::RacerTuning;

    /// A track barely wider than the car: every obstacle lands on it
    fn crash_course() -> ArcadeConfig {
        ArcadeConfig {
            racer: RacerTuning {
                track: Vec2::new(60.0, 400.0),
                car_start: Vec2::new(0.0, 300.0),
                spawn_chance: 1.0,
                ..RacerTuning::default()
            },
            ..ArcadeConfig::default()
        }
    }

    fn play_until_over(arcade: &mut Arcade) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..200 {
            arcade.handle_input(&InputEvent::KeyDown(Key::Up));
            events.extend(arcade.advance(16.0));
            if arcade.phase() == Some(GamePhase::GameOver) {
                break;
            }
        }
        events
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ArcadeConfig::default();
        config.racer.spawn_chance = 2.0;
        assert!(Arcade::new(config, 1).is_err());
    }

    #[test]
    fn test_nothing_mounted() {
        let mut arcade = Arcade::new(ArcadeConfig::default(), 1).unwrap();
        assert!(!arcade.start());
        assert!(arcade.advance(100.0).is_empty());
        assert_eq!(arcade.snapshot(), None);
        assert_eq!(arcade.active_timers(), 0);
    }

    #[test]
    fn test_mount_replaces_previous_game() {
        let mut arcade = Arcade::new(ArcadeConfig::default(), 1).unwrap();
        arcade.mount(GameKind::Flappy);
        arcade.start();
        assert_eq!(arcade.active_timers(), 2);

        arcade.mount(GameKind::Snake);
        assert_eq!(arcade.active(), Some(GameKind::Snake));
        assert_eq!(arcade.phase(), Some(GamePhase::Idle));
        assert_eq!(arcade.active_timers(), 0);

        arcade.start();
        assert_eq!(arcade.active_timers(), 1);
        arcade.unmount();
        assert_eq!(arcade.active(), None);
        assert_eq!(arcade.active_timers(), 0);
    }

    #[test]
    fn test_enter_starts_and_restarts() {
        let mut arcade = Arcade::new(crash_course(), 3).unwrap();
        arcade.mount(GameKind::Racer);
        arcade.handle_input(&InputEvent::KeyDown(Key::Enter));
        assert_eq!(arcade.phase(), Some(GamePhase::Running));

        play_until_over(&mut arcade);
        assert_eq!(arcade.phase(), Some(GamePhase::GameOver));

        arcade.handle_input(&InputEvent::KeyDown(Key::Enter));
        let snapshot = arcade.snapshot().unwrap();
        assert_eq!(snapshot.phase, GamePhase::Running);
        assert_eq!(snapshot.score, 0);
    }

    #[test]
    fn test_crash_recorded_and_best_carried_across_mounts() {
        let mut arcade = Arcade::new(crash_course(), 5).unwrap();
        arcade.mount(GameKind::Racer);
        arcade.start();
        let events = play_until_over(&mut arcade);

        let crashed = events
            .iter()
            .find_map(|e| match e {
                GameEvent::Crashed { score, .. } => Some(*score),
                _ => None,
            })
            .unwrap();
        assert!(crashed > 0);
        assert_eq!(arcade.scores().best(GameKind::Racer), crashed);
        assert_eq!(arcade.scores().entries(GameKind::Racer)[0].run, 1);

        arcade.mount(GameKind::Snake);
        arcade.mount(GameKind::Racer);
        let snapshot = arcade.snapshot().unwrap();
        assert_eq!(snapshot.best, crashed);
        assert_eq!(snapshot.score, 0);
    }

    #[test]
    fn test_pointer_restarts_flappy_only() {
        let mut arcade = Arcade::new(ArcadeConfig::default(), 11).unwrap();
        arcade.mount(GameKind::Flappy);
        arcade.handle_input(&InputEvent::Pointer);
        assert_eq!(arcade.phase(), Some(GamePhase::Running));

        // Free fall into the floor, then a click starts over
        for _ in 0..200 {
            arcade.advance(16.0);
            if arcade.phase() == Some(GamePhase::GameOver) {
                break;
            }
        }
        assert_eq!(arcade.phase(), Some(GamePhase::GameOver));
        arcade.handle_input(&InputEvent::Pointer);
        assert_eq!(arcade.phase(), Some(GamePhase::Running));
        assert_eq!(arcade.snapshot().unwrap().tick, 0);

        arcade.mount(GameKind::Racer);
        arcade.handle_input(&InputEvent::Pointer);
        assert_eq!(arcade.phase(), Some(GamePhase::Idle));
    }

    #[test]
    fn test_live_rank_tracks_current_run() {
        let mut arcade = Arcade::new(crash_course(), 13).unwrap();
        arcade.mount(GameKind::Racer);
        assert_eq!(arcade.live_rank(), None);

        arcade.start();
        play_until_over(&mut arcade);
        let best = arcade.scores().best(GameKind::Racer);
        assert!(best > 0);

        arcade.start();
        assert_eq!(arcade.live_rank(), None);
        for _ in 0..3 {
            arcade.handle_input(&InputEvent::KeyDown(Key::Up));
            arcade.advance(16.0);
        }
        // A small positive score lands below the recorded run
        assert_eq!(arcade.live_rank(), Some(2));
    }

    #[test]
    fn test_abandoned_run_is_not_a_high_score() {
        let mut arcade = Arcade::new(ArcadeConfig::default(), 7).unwrap();
        arcade.mount(GameKind::Racer);
        arcade.start();
        for _ in 0..10 {
            arcade.handle_input(&InputEvent::KeyDown(Key::Up));
            arcade.advance(16.0);
        }
        arcade.unmount();
        assert!(arcade.scores().is_empty());
    }
}
