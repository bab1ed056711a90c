//! Virtual timers for the tick scheduler
//!
//! The host hands in elapsed wall-clock time (a requestAnimationFrame
//! timestamp delta on the web, a sleep loop natively) and gets back the
//! timer fires that fell due, in order. Nothing here touches a real clock,
//! so every run is reproducible from its inputs.

use serde::{Deserialize, Serialize};

/// Nominal frame step used by [`Cadence::Frame`] timers (60 Hz)
pub const FRAME_DT: f32 = 1.0 / 60.0;
/// Longest elapsed slice accepted per `advance` call (tab-switch guard)
pub const MAX_FRAME_MS: f64 = 250.0;
/// Maximum fires per timer per `advance` call to prevent spiral of death
pub const MAX_SUBSTEPS: u32 = 8;

/// How often a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cadence {
    /// Once per host frame callback
    Frame,
    /// Once per fixed interval in milliseconds
    Every(u32),
}

impl Cadence {
    /// Simulation step in seconds for a tick driven at this cadence
    pub fn step_secs(&self) -> f32 {
        match self {
            Cadence::Frame => FRAME_DT,
            Cadence::Every(ms) => *ms as f32 / 1000.0,
        }
    }
}

/// What a fire means to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRole {
    /// Run one simulation tick
    Step,
    /// Mark a spawn cycle as due for the next tick
    Spawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u32);

/// A timer that fell due during `advance`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerFire {
    pub id: TimerId,
    pub role: TimerRole,
    /// Scheduler clock (ms) at which the fire was due
    pub due_ms: f64,
    generation: u64,
}

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    role: TimerRole,
    cadence: Cadence,
    next_due_ms: f64,
}

/// Owns every timer a game run registers so teardown is total
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: Vec<Timer>,
    clock_ms: f64,
    generation: u64,
    next_id: u32,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a timer; intervals first fire one full period from now
    pub fn start(&mut self, role: TimerRole, cadence: Cadence) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let next_due_ms = match cadence {
            Cadence::Frame => self.clock_ms,
            Cadence::Every(ms) => self.clock_ms + f64::from(ms.max(1)),
        };
        self.timers.push(Timer {
            id,
            role,
            cadence,
            next_due_ms,
        });
        log::debug!("Timer {:?} started ({:?}, {:?})", id, role, cadence);
        id
    }

    /// Cancel every timer. Idempotent; fires already handed out become stale.
    pub fn stop(&mut self) {
        if !self.timers.is_empty() {
            log::debug!("Stopping {} timer(s)", self.timers.len());
        }
        self.timers.clear();
        self.generation += 1;
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    /// Whether a fire may still be delivered (no `stop` since)
    pub fn is_live(&self, fire: &TimerFire) -> bool {
        fire.generation == self.generation && self.timers.iter().any(|t| t.id == fire.id)
    }

    /// Advance the scheduler clock and collect the fires that fell due
    pub fn advance(&mut self, elapsed_ms: f64) -> Vec<TimerFire> {
        let elapsed = if elapsed_ms.is_finite() {
            elapsed_ms.clamp(0.0, MAX_FRAME_MS)
        } else {
            0.0
        };
        self.clock_ms += elapsed;
        let now = self.clock_ms;

        let mut fires = Vec::new();
        for (order, timer) in self.timers.iter_mut().enumerate() {
            match timer.cadence {
                Cadence::Frame => {
                    timer.next_due_ms = now;
                    fires.push((order, TimerFire {
                        id: timer.id,
                        role: timer.role,
                        due_ms: now,
                        generation: self.generation,
                    }));
                }
                Cadence::Every(ms) => {
                    let period = f64::from(ms.max(1));
                    let mut substeps = 0;
                    while timer.next_due_ms <= now && substeps < MAX_SUBSTEPS {
                        fires.push((order, TimerFire {
                            id: timer.id,
                            role: timer.role,
                            due_ms: timer.next_due_ms,
                            generation: self.generation,
                        }));
                        timer.next_due_ms += period;
                        substeps += 1;
                    }
                    if timer.next_due_ms <= now {
                        log::warn!(
                            "Timer {:?} fell behind, dropping {:.0} ms of backlog",
                            timer.id,
                            now - timer.next_due_ms
                        );
                        timer.next_due_ms = now + period;
                    }
                }
            }
        }

        fires.sort_by(|(oa, a), (ob, b)| a.due_ms.total_cmp(&b.due_ms).then(oa.cmp(ob)));
        fires.into_iter().map(|(_, fire)| fire).collect()
    }
}
