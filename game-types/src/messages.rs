use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GamePost, LeaderboardEntry, Level, PostType, Statement, UserGuess, UserScore};

/// Envelope for every HTTP response consumed by the web form.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "status", rename_all = "lowercase")]
#[ts(export)]
pub enum ApiResponse<T> {
    Success { data: T },
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreatePostRequest {
    pub truth1: Statement,
    pub truth2: Statement,
    pub lie: Statement,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreatePostResponse {
    pub post_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PostTypeResponse {
    pub post_type: Option<PostType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PostResponse {
    pub game_post: GamePost,
    pub has_guessed: bool,
    pub user_guess: Option<UserGuess>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessRequest {
    pub post_id: String,
    pub guess_index: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessResponse {
    pub is_correct: bool,
    pub lie_index: u8,
    pub game_post: GamePost,
    pub user_score: UserScore,
    pub leveled_up: bool,
    pub new_level: Option<Level>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserStats {
    pub score: UserScore,
    pub guesser_rank: Option<u32>,
    pub liar_rank: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardResponse {
    pub guesser_leaderboard: Vec<LeaderboardEntry>,
    pub liar_leaderboard: Vec<LeaderboardEntry>,
    pub user_stats: Option<UserStats>,
}
