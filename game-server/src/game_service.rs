use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::identity::UserContext;
use crate::jobs::{JOB_LEVEL_UP_NOTIFICATION, JOB_SYNC_FLAIR};
use crate::platform::{JobScheduler, PlatformClient};
use game_core::{
    LIAR_POINTS_PER_MISS, current_week_number, experience_for_guess, guesser_points_for_guess,
    pick_lie_index, validate_guess_index, validate_statements,
};
use game_persistence::{PostRepository, ScoreRepository};
use game_types::{
    CreatePostRequest, CreatePostResponse, GameError, GamePost, GuessRequest, GuessResponse,
    LeaderboardKind, LeaderboardResponse, Level, PostResponse, PostType, PostTypeResponse,
    Timeframe, UserGuess, UserStats,
};

/// Orchestrates the game operations behind the HTTP surface: post
/// creation, guess resolution and leaderboard queries.
pub struct GameService {
    posts: Arc<PostRepository>,
    scores: Arc<ScoreRepository>,
    platform: Arc<dyn PlatformClient>,
    scheduler: Arc<dyn JobScheduler>,
}

impl GameService {
    pub fn new(
        posts: Arc<PostRepository>,
        scores: Arc<ScoreRepository>,
        platform: Arc<dyn PlatformClient>,
        scheduler: Arc<dyn JobScheduler>,
    ) -> Self {
        Self {
            posts,
            scores,
            platform,
            scheduler,
        }
    }

    /// Validate the three statements, submit the post through the platform
    /// and persist the game record with a randomly chosen lie display slot.
    pub async fn create_game_post(
        &self,
        author: &UserContext,
        request: CreatePostRequest,
    ) -> Result<CreatePostResponse, GameError> {
        validate_statements(&request.truth1, &request.truth2, &request.lie)?;

        let settings = self
            .posts
            .get_settings()
            .await?
            .ok_or_else(|| GameError::NotFound("Game settings".to_string()))?;

        let title = format!("Two Truths One Lie from u/{}", author.username);
        let submitted = self
            .platform
            .submit_post(&settings.subreddit_name, &title)
            .await?;

        let post = GamePost {
            post_id: submitted.id,
            author_id: author.user_id.clone(),
            author_username: author.username.clone(),
            truth1: request.truth1,
            truth2: request.truth2,
            lie: request.lie,
            lie_index: pick_lie_index(),
            created_at: Utc::now().to_rfc3339(),
            total_guesses: 0,
            correct_guesses: 0,
            guess_breakdown: [0, 0, 0],
        };
        self.posts.create_game_post(&post).await?;

        info!(post_id = %post.post_id, author = %author.username, "created game post");
        Ok(CreatePostResponse {
            post_id: post.post_id,
        })
    }

    pub async fn post_type(&self, post_id: &str) -> Result<PostTypeResponse, GameError> {
        let post_type = self.posts.get_post_type(post_id).await?;
        Ok(PostTypeResponse { post_type })
    }

    pub async fn get_post(
        &self,
        viewer: Option<&UserContext>,
        post_id: &str,
    ) -> Result<PostResponse, GameError> {
        let game_post = self
            .posts
            .get_game_post(post_id)
            .await?
            .ok_or_else(|| GameError::NotFound("Game post".to_string()))?;

        let user_guess = match viewer {
            Some(viewer) => self.posts.get_user_guess(post_id, &viewer.user_id).await?,
            None => None,
        };
        Ok(PostResponse {
            game_post,
            has_guessed: user_guess.is_some(),
            user_guess,
        })
    }

    /// Resolve one player's guess. Preconditions are checked in order with
    /// no partial effects; the create-if-absent guess write is the actual
    /// duplicate guard, and scoring only proceeds once it wins.
    pub async fn submit_guess(
        &self,
        guesser: &UserContext,
        request: GuessRequest,
    ) -> Result<GuessResponse, GameError> {
        match self.posts.get_post_type(&request.post_id).await? {
            Some(PostType::Game) => {}
            Some(_) => return Err(GameError::NotAGamePost),
            None => return Err(GameError::NotFound("Game post".to_string())),
        }
        let post = self
            .posts
            .get_game_post(&request.post_id)
            .await?
            .ok_or_else(|| GameError::NotFound("Game post".to_string()))?;

        if self
            .posts
            .get_user_guess(&request.post_id, &guesser.user_id)
            .await?
            .is_some()
        {
            return Err(GameError::DuplicateGuess);
        }
        if guesser.user_id == post.author_id {
            return Err(GameError::SelfGuess);
        }
        validate_guess_index(request.guess_index)?;

        let is_correct = post.is_lie(request.guess_index);
        let guess = UserGuess {
            user_id: guesser.user_id.clone(),
            username: guesser.username.clone(),
            post_id: request.post_id.clone(),
            guess_index: request.guess_index,
            is_correct,
            timestamp: Utc::now().to_rfc3339(),
        };
        if !self.posts.try_record_guess(&guess).await? {
            // Lost the race against another request from the same user.
            return Err(GameError::DuplicateGuess);
        }

        let game_post = self
            .posts
            .apply_guess_to_post(&request.post_id, request.guess_index, is_correct)
            .await?;

        let experience_update = self
            .scores
            .award_experience(
                &guesser.user_id,
                &guesser.username,
                experience_for_guess(is_correct),
            )
            .await?;
        let points_update = self
            .scores
            .award_guesser_points(
                &guesser.user_id,
                &guesser.username,
                guesser_points_for_guess(is_correct),
            )
            .await?;

        if !is_correct && post.author_id != guesser.user_id {
            self.scores
                .award_liar_points(&post.author_id, &post.author_username, LIAR_POINTS_PER_MISS)
                .await?;
        }

        if experience_update.leveled_up {
            self.enqueue_level_up(guesser, experience_update.new_level.as_ref())
                .await;
        }

        Ok(GuessResponse {
            is_correct,
            lie_index: post.lie_index,
            game_post,
            user_score: points_update.score,
            leveled_up: experience_update.leveled_up,
            new_level: experience_update.new_level,
        })
    }

    pub async fn get_leaderboard(
        &self,
        viewer: Option<&UserContext>,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<LeaderboardResponse, GameError> {
        let guesser_leaderboard = self
            .scores
            .get_leaderboard(LeaderboardKind::Guesser, timeframe, limit)
            .await?;
        let liar_leaderboard = self
            .scores
            .get_leaderboard(LeaderboardKind::Liar, timeframe, limit)
            .await?;

        let user_stats = match viewer {
            Some(viewer) => {
                let score = self.scores.get_user_score(&viewer.user_id).await?;
                let guesser_rank = self
                    .scores
                    .get_user_rank(&viewer.user_id, LeaderboardKind::Guesser, timeframe)
                    .await?;
                let liar_rank = self
                    .scores
                    .get_user_rank(&viewer.user_id, LeaderboardKind::Liar, timeframe)
                    .await?;
                Some(UserStats {
                    score,
                    guesser_rank,
                    liar_rank,
                })
            }
            None => None,
        };

        Ok(LeaderboardResponse {
            guesser_leaderboard,
            liar_leaderboard,
            user_stats,
        })
    }

    /// Level-up side effects run decoupled from the request: a scheduler
    /// failure is logged, never failing the already recorded guess.
    async fn enqueue_level_up(&self, guesser: &UserContext, new_level: Option<&Level>) {
        let Some(level) = new_level else { return };

        let data = json!({
            "user_id": guesser.user_id,
            "username": guesser.username,
            "level": level.level,
            "level_name": level.name,
        });
        if let Err(error) = self.scheduler.run_job(JOB_LEVEL_UP_NOTIFICATION, data).await {
            warn!(username = %guesser.username, %error, "failed to enqueue level-up notification");
        }
        if let Err(error) = self.scheduler.run_job(JOB_SYNC_FLAIR, json!({})).await {
            warn!(%error, "failed to enqueue flair sync");
        }
    }

    /// Subscribe the installing moderator's community once at install time
    /// and seed the rollover watermark, so the first weekly rollover knows
    /// where its sweep starts.
    pub async fn install(&self, settings: &game_types::GameSettings) -> Result<bool, GameError> {
        let installed = self.posts.init_settings(settings).await?;
        if installed {
            self.scores
                .set_rollover_watermark(current_week_number())
                .await?;
            self.platform
                .subscribe_to_subreddit(&settings.subreddit_name)
                .await?;
        }
        Ok(installed)
    }
}
