//! Raw input events and the single-slot intent cell

use serde::{Deserialize, Serialize};

/// Keys the games care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" | "w" | "W" => Some(Key::Up),
            "ArrowDown" | "s" | "S" => Some(Key::Down),
            "ArrowLeft" | "a" | "A" => Some(Key::Left),
            "ArrowRight" | "d" | "D" => Some(Key::Right),
            " " | "Spacebar" => Some(Key::Space),
            "Enter" => Some(Key::Enter),
            _ => None,
        }
    }

    /// Keys whose browser default (scrolling) the host should suppress.
    /// Letters and Enter are left alone so text fields keep working.
    pub fn scrolls_page(key: &str) -> bool {
        matches!(key, "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight" | " " | "Spacebar")
    }
}

/// An input event as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    /// Click or tap anywhere on the game surface
    Pointer,
}

/// Pending intent, written by input handlers and taken by the tick.
///
/// Holds at most one value: a newer intent replaces an older one that the
/// tick has not consumed yet.
#[derive(Debug, Clone)]
pub struct IntentSlot<T> {
    pending: Option<T>,
}

impl<T> Default for IntentSlot<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T: Copy> IntentSlot<T> {
    pub fn record(&mut self, intent: T) {
        self.pending = Some(intent);
    }

    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn peek(&self) -> Option<T> {
        self.pending
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
