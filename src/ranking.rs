//! Result summaries, grading and the leaderboard
//!
//! Keeps the top 10 runs in memory. Saving and loading them is left to the
//! host (the leaderboard is plain serde data).

use serde::{Deserialize, Serialize};

/// Maximum number of leaderboard entries to keep
pub const MAX_ENTRIES: usize = 10;

/// Snapshot of a finished (or running) session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub score: u64,
    pub lives_remaining: u32,
    pub destroyed_bricks: u32,
    pub total_bricks: u32,
    pub remaining_time: f32,
}

impl GameSummary {
    /// Fraction of bricks destroyed, 0.0 when the stage had none
    pub fn clear_ratio(&self) -> f32 {
        if self.total_bricks == 0 {
            return 0.0;
        }
        self.destroyed_bricks as f32 / self.total_bricks as f32
    }

    /// Clear ratio as 0-100
    pub fn clear_percentage(&self) -> u32 {
        (self.clear_ratio() * 100.0).floor() as u32
    }

    pub fn rank(&self) -> Rank {
        Rank::from_summary(self)
    }
}

/// How well the fish was cut, best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    /// Every brick
    Osashimi,
    /// 80 % or more
    Tataki,
    /// 60 % or more
    Nigiri,
    /// 40 % or more
    Arani,
    Esa,
}

impl Rank {
    pub fn from_summary(summary: &GameSummary) -> Self {
        if summary.total_bricks > 0 && summary.destroyed_bricks >= summary.total_bricks {
            return Rank::Osashimi;
        }
        match summary.clear_ratio() {
            r if r >= 0.8 => Rank::Tataki,
            r if r >= 0.6 => Rank::Nigiri,
            r if r >= 0.4 => Rank::Arani,
            _ => Rank::Esa,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Osashimi => "Osashimi",
            Rank::Tataki => "Tataki",
            Rank::Nigiri => "Nigiri",
            Rank::Arani => "Arani",
            Rank::Esa => "Esa",
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single leaderboard entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub stage_id: u32,
    pub summary: GameSummary,
    pub rank: Rank,
}

/// Best runs, sorted by score descending
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_ENTRIES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.summary.score)
    }

    /// Position a score would take (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let pos = self.entries.iter().position(|e| score > e.summary.score);
        Some(pos.unwrap_or(self.entries.len()) + 1)
    }

    /// Record a finished run. Returns its position (1-indexed) if it made the board
    pub fn add(&mut self, stage_id: u32, summary: GameSummary) -> Option<usize> {
        let place = self.potential_rank(summary.score)?;
        self.entries.insert(
            place - 1,
            LeaderboardEntry {
                stage_id,
                summary,
                rank: summary.rank(),
            },
        );
        self.entries.truncate(MAX_ENTRIES);
        log::info!("Leaderboard: score {} placed #{}", summary.score, place);
        Some(place)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.summary.score)
    }

    pub fn to_json(&self) -> Result<String, crate::ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, crate::ConfigError> {
        let mut board: Leaderboard = serde_json::from_str(json)?;
        board
            .entries
            .sort_by(|a, b| b.summary.score.cmp(&a.summary.score));
        board.entries.truncate(MAX_ENTRIES);
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(score: u64, destroyed: u32, total: u32) -> GameSummary {
        GameSummary {
            score,
            lives_remaining: 1,
            destroyed_bricks: destroyed,
            total_bricks: total,
            remaining_time: 0.0,
        }
    }

    #[test]
    fn test_rank_thresholds() {
        assert_eq!(summary(0, 10, 10).rank(), Rank::Osashimi);
        assert_eq!(summary(0, 9, 10).rank(), Rank::Tataki);
        assert_eq!(summary(0, 8, 10).rank(), Rank::Tataki);
        assert_eq!(summary(0, 6, 10).rank(), Rank::Nigiri);
        assert_eq!(summary(0, 4, 10).rank(), Rank::Arani);
        assert_eq!(summary(0, 3, 10).rank(), Rank::Esa);
        assert_eq!(summary(0, 0, 0).rank(), Rank::Esa);
    }

    #[test]
    fn test_clear_percentage() {
        assert_eq!(summary(0, 1, 3).clear_percentage(), 33);
        assert_eq!(summary(0, 3, 3).clear_percentage(), 100);
        assert_eq!(summary(0, 0, 0).clear_percentage(), 0);
    }

    #[test]
    fn test_leaderboard_sorted_and_capped() {
        let mut board = Leaderboard::new();
        assert!(!board.qualifies(0));

        for s in 1..=12u64 {
            board.add(1, summary(s * 10, 1, 1));
        }
        assert_eq!(board.entries.len(), MAX_ENTRIES);
        assert_eq!(board.top_score(), Some(120));
        assert_eq!(board.entries.last().map(|e| e.summary.score), Some(30));

        assert!(!board.qualifies(30));
        assert_eq!(board.potential_rank(55), Some(8));
        assert_eq!(board.add(2, summary(125, 1, 1)), Some(1));
    }

    #[test]
    fn test_json_round_trip() {
        let mut board = Leaderboard::new();
        board.add(1, summary(50, 5, 10));
        board.add(1, summary(70, 10, 10));
        let back = Leaderboard::from_json(&board.to_json().unwrap()).unwrap();
        assert_eq!(back.top_score(), Some(70));
        assert_eq!(back.entries[0].rank, Rank::Osashimi);
    }
}
