//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time/ticks (virtual timers fed by host frame callbacks)
//! - Input events
//! - The browser host binding (wasm32 only)

pub mod input;
pub mod timers;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::{InputEvent, IntentSlot, Key};
pub use timers::{Cadence, FRAME_DT, Scheduler, TimerFire, TimerId, TimerRole};
