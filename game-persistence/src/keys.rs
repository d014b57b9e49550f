//! Persisted key layout. Every component addresses the store through these
//! helpers so the layout stays in one place.

use game_types::{LeaderboardKind, Timeframe};

pub const PINNED_POST: &str = "pinned_post";
pub const GAME_SETTINGS: &str = "game_settings";
pub const ROLLOVER_WEEK: &str = "weekly_rollover_week";

pub fn game_post(post_id: &str) -> String {
    format!("game_post:{post_id}")
}

pub fn user_guess(post_id: &str, user_id: &str) -> String {
    format!("user_guess:{post_id}:{user_id}")
}

pub fn user_score(user_id: &str) -> String {
    format!("user_score:{user_id}")
}

pub fn post_type(post_id: &str) -> String {
    format!("post_type:{post_id}")
}

/// `week` is only used for the weekly timeframe.
pub fn leaderboard(kind: LeaderboardKind, timeframe: Timeframe, week: u32) -> String {
    let kind = match kind {
        LeaderboardKind::Guesser => "guesser",
        LeaderboardKind::Liar => "liar",
    };
    match timeframe {
        Timeframe::Weekly => format!("leaderboard:{kind}:weekly:{week}"),
        Timeframe::AllTime => format!("leaderboard:{kind}:alltime"),
    }
}
