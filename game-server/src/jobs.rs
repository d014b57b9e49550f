use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::platform::{JobScheduler, PlatformClient};
use game_core::{level_by_number, level_for_experience, week_number};
use game_persistence::{PostRepository, ScoreRepository};
use game_types::{GameError, LeaderboardKind, Timeframe};

pub const JOB_SYNC_FLAIR: &str = "sync-flair";
pub const JOB_LEVEL_UP_NOTIFICATION: &str = "level-up-notification";

/// Weekly leaderboard sets kept readable after their week ends.
pub const KEEP_WEEKS: u32 = 4;
/// How far behind the retention horizon each rollover sweeps.
pub const PRUNE_WINDOW_WEEKS: u32 = 10;

/// Periodic maintenance over the score engine: cosmetic flair sync and the
/// weekly points rollover. Both are idempotent and never touch all-time
/// points.
pub struct MaintenanceJobs {
    posts: Arc<PostRepository>,
    scores: Arc<ScoreRepository>,
    platform: Arc<dyn PlatformClient>,
}

impl MaintenanceJobs {
    pub fn new(
        posts: Arc<PostRepository>,
        scores: Arc<ScoreRepository>,
        platform: Arc<dyn PlatformClient>,
    ) -> Self {
        Self {
            posts,
            scores,
            platform,
        }
    }

    /// Push username, level and weekly rank to the platform's flair for
    /// everyone on this week's leaderboards.
    pub async fn sync_flair(&self) -> Result<(), GameError> {
        let Some(settings) = self.posts.get_settings().await? else {
            // Nothing to sync before the app is installed.
            return Ok(());
        };

        let week = game_core::current_week_number();
        let members = self.scores.members_for_week(week).await?;
        info!(week, users = members.len(), "syncing user flair");

        for user_id in members {
            let score = self.scores.get_user_score(&user_id).await?;
            if score.username.is_empty() {
                continue;
            }
            let level = level_by_number(score.level)
                .unwrap_or_else(|| level_for_experience(score.experience));
            let rank = self
                .scores
                .get_user_rank(&user_id, LeaderboardKind::Guesser, Timeframe::Weekly)
                .await?;

            let text = match rank {
                Some(rank) => format!("{} | #{} this week", level.flair_text, rank),
                None => level.flair_text.clone(),
            };
            self.platform
                .set_user_flair(&settings.subreddit_name, &score.username, &text, &level.flair_color)
                .await?;
        }
        Ok(())
    }

    /// Zero the weekly point fields of everyone who scored in any week
    /// since the last rollover, prune leaderboard sets past the retention
    /// window and refresh flair. Sweeping from the persisted watermark
    /// means skipped runs and year boundaries leave no stale points
    /// behind. Safe to re-run against the same week.
    pub async fn weekly_rollover(&self, now: DateTime<Utc>) -> Result<(), GameError> {
        let current_week = week_number(now);
        let start = match self.scores.rollover_watermark().await? {
            Some(week) => week,
            None => current_week.saturating_sub(1),
        };

        for week in start..current_week {
            let members = self.scores.members_for_week(week).await?;
            info!(week, users = members.len(), "rolling over weekly points");
            for user_id in members {
                self.scores.reset_weekly_points(&user_id).await?;
            }
        }
        if current_week > start {
            self.scores.set_rollover_watermark(current_week).await?;
        }

        self.scores
            .prune_weekly_leaderboards(current_week, KEEP_WEEKS, PRUNE_WINDOW_WEEKS)
            .await?;
        self.sync_flair().await
    }
}

/// Scheduler backing for running outside the hosting runtime: jobs execute
/// on spawned tasks instead of the platform's job queue.
pub struct LocalScheduler {
    jobs: Arc<MaintenanceJobs>,
    platform: Arc<dyn PlatformClient>,
}

impl LocalScheduler {
    pub fn new(jobs: Arc<MaintenanceJobs>, platform: Arc<dyn PlatformClient>) -> Self {
        Self { jobs, platform }
    }
}

#[async_trait]
impl JobScheduler for LocalScheduler {
    async fn run_job(&self, name: &str, data: serde_json::Value) -> Result<()> {
        match name {
            JOB_SYNC_FLAIR => {
                let jobs = self.jobs.clone();
                tokio::spawn(async move {
                    if let Err(error) = jobs.sync_flair().await {
                        warn!(%error, "flair sync job failed");
                    }
                });
            }
            JOB_LEVEL_UP_NOTIFICATION => {
                let username = data["username"].as_str().unwrap_or_default().to_string();
                let level = data["level"].as_u64().unwrap_or_default();
                let level_name = data["level_name"].as_str().unwrap_or_default().to_string();
                if username.is_empty() {
                    bail!("level-up notification without a username");
                }

                let platform = self.platform.clone();
                tokio::spawn(async move {
                    let subject = "You leveled up!".to_string();
                    let text = format!(
                        "Congratulations u/{username}, you reached level {level} ({level_name})! Keep guessing to climb the leaderboard."
                    );
                    if let Err(error) = platform.send_private_message(&username, &subject, &text).await
                    {
                        warn!(username, %error, "level-up notification failed");
                    }
                });
            }
            unknown => bail!("unknown job: {unknown}"),
        }
        Ok(())
    }
}
