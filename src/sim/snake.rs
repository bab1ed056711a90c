//! Grid snake
//!
//! The head steps one cell per tick. Eating food keeps the tail (the body
//! grows by one) and respawns the food on a free cell.

use std::collections::VecDeque;

use glam::IVec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Collision, CrashCause, cell_hits, cell_in_grid};
use super::geom::Heading;
use super::state::{GameEvent, WorldView};
use super::tick::Simulation;
use crate::platform::{Cadence, InputEvent, Key};
use crate::settings::{GameKind, SnakeTuning};

/// Random draws before falling back to a scan for a free cell
const MAX_FOOD_ATTEMPTS: u32 = 64;

/// Pick a food cell not covered by the body.
///
/// Rejection-samples uniformly over the grid; after `MAX_FOOD_ATTEMPTS`
/// misses it takes the first free cell in row-major order. Returns `None`
/// only when the body fills the whole grid.
pub fn place_food<'a, R, I>(rng: &mut R, grid: IVec2, body: I) -> Option<IVec2>
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = &'a IVec2> + Clone,
{
    for _ in 0..MAX_FOOD_ATTEMPTS {
        let cell = IVec2::new(rng.random_range(0..grid.x), rng.random_range(0..grid.y));
        if !cell_hits(cell, body.clone()) {
            return Some(cell);
        }
    }
    (0..grid.y)
        .flat_map(|y| (0..grid.x).map(move |x| IVec2::new(x, y)))
        .find(|cell| !cell_hits(*cell, body.clone()))
}

/// Snapshot of the snake world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakeView {
    pub grid: IVec2,
    pub cell_px: u32,
    /// Head first
    pub body: Vec<IVec2>,
    pub food: Option<IVec2>,
    pub heading: Heading,
}

pub struct Snake {
    tuning: SnakeTuning,
    /// Head first
    body: VecDeque<IVec2>,
    heading: Heading,
    food: Option<IVec2>,
    /// Tail cell given up by this tick's step, restored if the head ate
    vacated: Option<IVec2>,
}

impl Snake {
    pub fn new(tuning: SnakeTuning) -> Self {
        let body = tuning.start_body.iter().copied().collect();
        let heading = tuning.start_heading;
        Self {
            tuning,
            body,
            heading,
            food: None,
            vacated: None,
        }
    }

    pub fn body(&self) -> &VecDeque<IVec2> {
        &self.body
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn food(&self) -> Option<IVec2> {
        self.food
    }

    #[cfg(test)]
    pub(crate) fn place_food_at(&mut self, cell: IVec2) {
        self.food = Some(cell);
    }

    #[cfg(test)]
    pub(crate) fn force_heading(&mut self, heading: Heading) {
        self.heading = heading;
    }

    #[cfg(test)]
    pub(crate) fn set_body(&mut self, body: &[IVec2], heading: Heading) {
        self.body = body.iter().copied().collect();
        self.heading = heading;
    }

    fn head(&self) -> IVec2 {
        // Body is never empty: validated at config time and only ever grows
        self.body.front().copied().unwrap_or_default()
    }
}

impl Simulation for Snake {
    type Intent = Heading;

    fn kind(&self) -> GameKind {
        GameKind::Snake
    }

    fn cadence(&self) -> Cadence {
        self.tuning.cadence
    }

    fn reset(&mut self, rng: &mut Pcg32) {
        self.body = self.tuning.start_body.iter().copied().collect();
        self.heading = self.tuning.start_heading;
        self.vacated = None;
        self.food = place_food(rng, self.tuning.grid, &self.body);
    }

    fn intent_for(&self, event: &InputEvent) -> Option<Heading> {
        let heading = match event {
            InputEvent::KeyDown(Key::Up) => Heading::Up,
            InputEvent::KeyDown(Key::Down) => Heading::Down,
            InputEvent::KeyDown(Key::Left) => Heading::Left,
            InputEvent::KeyDown(Key::Right) => Heading::Right,
            _ => return None,
        };
        // Reversing would put the head straight into the neck
        (heading != self.heading.opposite()).then_some(heading)
    }

    fn apply_intent(&mut self, heading: Heading) {
        if heading != self.heading.opposite() {
            self.heading = heading;
        }
    }

    fn advance(&mut self, _dt: f32) {
        let head = self.head() + self.heading.delta();
        self.body.push_front(head);
        self.vacated = self.body.pop_back();
    }

    fn spawn(&mut self, _rng: &mut Pcg32, _cycle_due: bool, _events: &mut Vec<GameEvent>) {
        // Food is replaced when eaten, during settle
    }

    fn detect_collision(&self) -> Collision {
        let head = self.head();
        if !cell_in_grid(head, self.tuning.grid) {
            return Collision::fatal(CrashCause::Wall);
        }
        // The pre-move body counts, including the tail that just moved off
        if cell_hits(head, self.body.iter().skip(1)) || self.vacated == Some(head) {
            return Collision::fatal(CrashCause::SelfCollision);
        }
        let mut collision = Collision::clear();
        if self.food == Some(head) {
            collision.contacts.push(0);
        }
        collision
    }

    fn settle(&mut self, collision: &Collision, rng: &mut Pcg32, events: &mut Vec<GameEvent>) -> u64 {
        if collision.contacts.is_empty() {
            return 0;
        }
        if let Some(tail) = self.vacated.take() {
            self.body.push_back(tail);
        }
        self.food = place_food(rng, self.tuning.grid, &self.body);
        if self.food.is_some() {
            events.push(GameEvent::Spawned);
        }
        log::debug!("Snake ate, length {}, food at {:?}", self.body.len(), self.food);
        self.tuning.food_points
    }

    fn view(&self) -> WorldView {
        WorldView::Snake(SnakeView {
            grid: self.tuning.grid,
            cell_px: self.tuning.cell_px,
            body: self.body.iter().copied().collect(),
            food: self.food,
            heading: self.heading,
        })
    }
}
