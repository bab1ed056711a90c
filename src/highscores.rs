//! High score leaderboard system
//!
//! One leaderboard per game, kept for the lifetime of the session only.
//! Tracks the top 10 runs of each game.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::settings::GameKind;

/// Maximum number of high scores to keep per game
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Final score of the run
    pub score: u64,
    /// Ticks survived
    pub ticks: u64,
    /// Run number within the mount that produced it
    pub run: u64,
}

/// Leaderboards for every game in the arcade
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    boards: HashMap<GameKind, Vec<HighScoreEntry>>,
}

impl HighScores {
    /// Create empty leaderboards
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries for one game, best first
    pub fn entries(&self, kind: GameKind) -> &[HighScoreEntry] {
        self.boards.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if a score qualifies for the game's leaderboard
    pub fn qualifies(&self, kind: GameKind, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        let entries = self.entries(kind);
        if entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Must beat the lowest entry
        entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, kind: GameKind, score: u64) -> Option<usize> {
        if !self.qualifies(kind, score) {
            return None;
        }
        let entries = self.entries(kind);
        let rank = entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(entries.len()) + 1)
    }

    /// Add a finished run to the game's leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, kind: GameKind, score: u64, ticks: u64, run: u64) -> Option<usize> {
        if !self.qualifies(kind, score) {
            return None;
        }

        let entry = HighScoreEntry { score, ticks, run };
        let entries = self.boards.entry(kind).or_default();

        // Sorted descending by score; ties keep the earlier run first
        let pos = entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                entries.insert(i, entry);
                i + 1
            }
            None => {
                entries.push(entry);
                entries.len()
            }
        };

        entries.truncate(MAX_HIGH_SCORES);
        log::info!("{} high score #{}: {}", kind.as_str(), rank, score);

        Some(rank)
    }

    /// Best score for a game this session, 0 if none
    pub fn best(&self, kind: GameKind) -> u64 {
        self.entries(kind).first().map(|e| e.score).unwrap_or(0)
    }

    /// Check if no game has a recorded score
    pub fn is_empty(&self) -> bool {
        self.boards.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_qualifies() {
        let scores = HighScores::new();
        assert!(!scores.qualifies(GameKind::Snake, 0));
        assert!(scores.qualifies(GameKind::Snake, 1));
        assert!(scores.is_empty());
    }

    #[test]
    fn test_sorted_and_ranked() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(GameKind::Snake, 30, 100, 1), Some(1));
        assert_eq!(scores.add_score(GameKind::Snake, 50, 200, 2), Some(1));
        assert_eq!(scores.add_score(GameKind::Snake, 40, 150, 3), Some(2));
        // Tie goes below the earlier run
        assert_eq!(scores.add_score(GameKind::Snake, 40, 90, 4), Some(3));

        let ordered: Vec<u64> = scores.entries(GameKind::Snake).iter().map(|e| e.score).collect();
        assert_eq!(ordered, vec![50, 40, 40, 30]);
        assert_eq!(scores.best(GameKind::Snake), 50);
        assert_eq!(scores.potential_rank(GameKind::Snake, 45), Some(2));
    }

    #[test]
    fn test_games_are_separate() {
        let mut scores = HighScores::new();
        scores.add_score(GameKind::Racer, 900, 60, 1);
        assert_eq!(scores.best(GameKind::Racer), 900);
        assert_eq!(scores.best(GameKind::Flappy), 0);
        assert!(scores.entries(GameKind::Flappy).is_empty());
    }

    #[test]
    fn test_board_is_capped() {
        let mut scores = HighScores::new();
        for i in 1..=MAX_HIGH_SCORES as u64 {
            scores.add_score(GameKind::Flappy, i * 10, i, i);
        }
        assert_eq!(scores.entries(GameKind::Flappy).len(), MAX_HIGH_SCORES);

        // Lower than the lowest entry
        assert!(!scores.qualifies(GameKind::Flappy, 5));
        assert_eq!(scores.add_score(GameKind::Flappy, 5, 1, 11), None);

        assert_eq!(scores.add_score(GameKind::Flappy, 15, 1, 12), Some(10));
        let entries = scores.entries(GameKind::Flappy);
        assert_eq!(entries.len(), MAX_HIGH_SCORES);
        assert_eq!(entries.last().map(|e| e.score), Some(15));
    }
}
