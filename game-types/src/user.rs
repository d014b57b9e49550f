use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Per-user score aggregate. Lazily created on the first score-affecting
/// event and never deleted. `level` is always derived from `experience` and
/// kept consistent by every mutation path.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserScore {
    pub user_id: String,
    pub username: String, // last-observed display name
    pub guesser_points: u32,
    pub liar_points: u32,
    pub weekly_guesser_points: u32,
    pub weekly_liar_points: u32,
    pub level: u32,
    pub experience: u32,
    pub total_games: u32,
    pub correct_guesses: u32,
}

impl UserScore {
    /// Zero-value record for a user that has never scored. Not persisted
    /// until an award operation writes it.
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            username: String::new(),
            guesser_points: 0,
            liar_points: 0,
            weekly_guesser_points: 0,
            weekly_liar_points: 0,
            level: 1,
            experience: 0,
            total_games: 0,
            correct_guesses: 0,
        }
    }
}

/// Static level-table entry. Thresholds are inclusive lower bounds on
/// experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Level {
    pub level: u32,
    pub name: String,
    pub experience_required: u32,
    pub flair_text: String,
    pub flair_color: String,
}

/// One row of a leaderboard query result. Derived view data, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: String,
    pub score: u32,
    pub rank: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum LeaderboardKind {
    Guesser,
    Liar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Timeframe {
    Weekly,
    AllTime,
}
