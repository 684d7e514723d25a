use std::cmp::Ordering;

use chrono::{DateTime, Local};
use itertools::Itertools;

/// The board keeps only the best five results.
pub const MAX_ENTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub wpm: f64,
    pub at: DateTime<Local>,
}

/// Best results of this process run, descending by speed. Ties keep
/// insertion order, so an earlier equal score stays ahead of a later one.
/// Nothing here survives a restart.
#[derive(Debug, Default)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Insert a result rounded to two decimals, re-rank, and trim to the
    /// top five. Returns the board after the insert.
    pub fn record(&mut self, wpm: f64) -> &[ScoreEntry] {
        let rounded = (wpm * 100.0).round() / 100.0;
        self.entries.push(ScoreEntry {
            wpm: rounded,
            at: Local::now(),
        });

        // Stable sort keeps earlier entries ahead on equal speed
        self.entries = self
            .entries
            .drain(..)
            .sorted_by(|a, b| b.wpm.partial_cmp(&a.wpm).unwrap_or(Ordering::Equal))
            .collect();
        self.entries.truncate(MAX_ENTRIES);

        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speeds(board: &Leaderboard) -> Vec<f64> {
        board.entries().iter().map(|e| e.wpm).collect()
    }

    #[test]
    fn keeps_the_top_five_in_descending_order() {
        let mut board = Leaderboard::new();
        for wpm in [40.0, 60.0, 55.0, 70.0, 45.0, 30.0] {
            board.record(wpm);
        }
        assert_eq!(speeds(&board), vec![70.0, 60.0, 55.0, 45.0, 40.0]);
    }

    #[test]
    fn rounds_to_two_decimals_on_insert() {
        let mut board = Leaderboard::new();
        board.record(42.12567);
        board.record(42.124);
        assert_eq!(speeds(&board), vec![42.13, 42.12]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut board = Leaderboard::new();
        let first = board.record(50.0).first().cloned().unwrap();
        board.record(50.0);

        assert_eq!(board.entries().len(), 2);
        // The earlier entry is still in front
        assert_eq!(board.entries()[0].at, first.at);
        assert_eq!(board.entries()[0].wpm, 50.0);
        assert_eq!(board.entries()[1].wpm, 50.0);
    }

    #[test]
    fn sixth_place_is_dropped() {
        let mut board = Leaderboard::new();
        for wpm in [10.0, 20.0, 30.0, 40.0, 50.0] {
            board.record(wpm);
        }
        board.record(5.0);
        assert_eq!(board.entries().len(), MAX_ENTRIES);
        assert!(!speeds(&board).contains(&5.0));
    }

    #[test]
    fn record_returns_the_updated_board() {
        let mut board = Leaderboard::new();
        let after = board.record(33.0);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].wpm, 33.0);
    }
}
