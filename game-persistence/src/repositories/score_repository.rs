use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::debug;

use crate::keys;
use crate::store::KvStore;
use game_core::{current_week_number, level_by_number, level_for_experience};
use game_types::{LeaderboardEntry, LeaderboardKind, Level, Timeframe, UserScore};

/// Bound on optimistic retry loops when concurrent awards race on the same
/// user record.
const MAX_CAS_ATTEMPTS: usize = 64;

/// Outcome of `update_user_score`: the single authoritative level-up
/// detection point. Callers wanting level-up notifications rely on this
/// instead of recomputing.
#[derive(Debug, Clone)]
pub struct LevelChange {
    pub leveled_up: bool,
    pub new_level: Option<Level>,
}

/// Outcome of an award operation: the persisted record plus the level
/// transition it caused.
#[derive(Debug, Clone)]
pub struct ScoreUpdate {
    pub score: UserScore,
    pub leveled_up: bool,
    pub new_level: Option<Level>,
}

/// The score engine: owns `UserScore` records and keeps the four
/// leaderboard sorted sets (guesser/liar x weekly/all-time) consistent with
/// them. All mutation goes through the award operations; writing fields
/// anywhere else would desynchronize the indices from the stored record.
pub struct ScoreRepository {
    store: Arc<dyn KvStore>,
}

impl ScoreRepository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn leaderboard_key(kind: LeaderboardKind, timeframe: Timeframe) -> String {
        // The week number is derived on every access, never cached, so the
        // weekly key rolls over at the boundary on its own.
        keys::leaderboard(kind, timeframe, current_week_number())
    }

    /// The persisted record, or a zero-value default (not persisted) for a
    /// user that has never scored.
    pub async fn get_user_score(&self, user_id: &str) -> Result<UserScore> {
        match self.store.get(&keys::user_score(user_id)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(UserScore::empty(user_id)),
        }
    }

    /// Recompute the level from experience, persist the full record and
    /// upsert all four leaderboard indices.
    pub async fn update_user_score(&self, mut score: UserScore) -> Result<LevelChange> {
        let previous_level = score.level;
        score.level = level_for_experience(score.experience).level;

        let raw = serde_json::to_string(&score)?;
        self.store.set(&keys::user_score(&score.user_id), &raw).await?;
        self.index_score(&score).await?;

        Ok(Self::level_change(previous_level, score.level))
    }

    pub async fn award_experience(
        &self,
        user_id: &str,
        username: &str,
        points: u32,
    ) -> Result<ScoreUpdate> {
        self.mutate(user_id, username, |score| {
            score.experience += points;
        })
        .await
    }

    /// Also counts the game, and the correct guess when points were earned.
    pub async fn award_guesser_points(
        &self,
        user_id: &str,
        username: &str,
        points: u32,
    ) -> Result<ScoreUpdate> {
        self.mutate(user_id, username, |score| {
            score.total_games += 1;
            if points > 0 {
                score.correct_guesses += 1;
            }
            score.guesser_points += points;
            score.weekly_guesser_points += points;
        })
        .await
    }

    pub async fn award_liar_points(
        &self,
        user_id: &str,
        username: &str,
        points: u32,
    ) -> Result<ScoreUpdate> {
        self.mutate(user_id, username, |score| {
            score.liar_points += points;
            score.weekly_liar_points += points;
        })
        .await
    }

    /// Zero the weekly point fields, leaving all-time points untouched.
    /// Used by the weekly rollover job; safe to re-run.
    pub async fn reset_weekly_points(&self, user_id: &str) -> Result<ScoreUpdate> {
        self.mutate(user_id, "", |score| {
            score.weekly_guesser_points = 0;
            score.weekly_liar_points = 0;
        })
        .await
    }

    /// Week up to which weekly points have been rolled over. Seeded at
    /// install time and advanced by every rollover, so a rollover always
    /// knows which weeks it still owes a sweep.
    pub async fn rollover_watermark(&self) -> Result<Option<u32>> {
        match self.store.get(keys::ROLLOVER_WEEK).await? {
            Some(raw) => Ok(Some(raw.parse()?)),
            None => Ok(None),
        }
    }

    pub async fn set_rollover_watermark(&self, week: u32) -> Result<()> {
        self.store.set(keys::ROLLOVER_WEEK, &week.to_string()).await
    }

    pub async fn get_leaderboard(
        &self,
        kind: LeaderboardKind,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let key = Self::leaderboard_key(kind, timeframe);
        let members = self.store.zrange(&key, 0, limit as i64 - 1, true).await?;

        let mut entries = Vec::with_capacity(members.len());
        for (position, member) in members.into_iter().enumerate() {
            let score = self.get_user_score(&member.member).await?;
            entries.push(LeaderboardEntry {
                user_id: member.member,
                username: score.username,
                score: member.score.max(0) as u32,
                rank: position as u32 + 1,
            });
        }
        Ok(entries)
    }

    /// 1-based rank in descending-score order, `None` for a user absent
    /// from the set.
    pub async fn get_user_rank(
        &self,
        user_id: &str,
        kind: LeaderboardKind,
        timeframe: Timeframe,
    ) -> Result<Option<u32>> {
        let key = Self::leaderboard_key(kind, timeframe);
        let rank = self.store.zrev_rank(&key, user_id).await?;
        Ok(rank.map(|rank| rank as u32 + 1))
    }

    /// Every user present in a given week's guesser or liar set,
    /// deduplicated and sorted.
    pub async fn members_for_week(&self, week: u32) -> Result<Vec<String>> {
        let mut members = Vec::new();
        for kind in [LeaderboardKind::Guesser, LeaderboardKind::Liar] {
            let key = keys::leaderboard(kind, Timeframe::Weekly, week);
            for entry in self.store.zrange(&key, 0, -1, false).await? {
                members.push(entry.member);
            }
        }
        members.sort();
        members.dedup();
        Ok(members)
    }

    /// Delete weekly sorted sets older than the retention window to bound
    /// storage growth. Keeps `keep_weeks` recent weeks and sweeps a
    /// `prune_window`-week span behind them.
    pub async fn prune_weekly_leaderboards(
        &self,
        current_week: u32,
        keep_weeks: u32,
        prune_window: u32,
    ) -> Result<()> {
        for delta in keep_weeks..keep_weeks + prune_window {
            let Some(week) = current_week.checked_sub(delta + 1) else {
                break;
            };
            for kind in [LeaderboardKind::Guesser, LeaderboardKind::Liar] {
                let key = keys::leaderboard(kind, Timeframe::Weekly, week);
                self.store.del(&key).await?;
            }
        }
        Ok(())
    }

    fn level_change(previous_level: u32, new_level: u32) -> LevelChange {
        let leveled_up = new_level > previous_level;
        LevelChange {
            leveled_up,
            new_level: leveled_up.then(|| level_by_number(new_level).cloned()).flatten(),
        }
    }

    /// Load-mutate-store under an optimistic compare-and-swap loop, so two
    /// awards racing on the same user never lose an update.
    async fn mutate<F>(&self, user_id: &str, username: &str, mut apply: F) -> Result<ScoreUpdate>
    where
        F: FnMut(&mut UserScore),
    {
        let key = keys::user_score(user_id);
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let existing = self.store.get(&key).await?;
            let mut score = match &existing {
                Some(raw) => serde_json::from_str(raw)?,
                None => UserScore::empty(user_id),
            };

            if !username.is_empty() {
                score.username = username.to_string();
            }
            apply(&mut score);

            let previous_level = score.level;
            score.level = level_for_experience(score.experience).level;

            let raw = serde_json::to_string(&score)?;
            if self
                .store
                .compare_and_swap(&key, existing.as_deref(), &raw)
                .await?
            {
                self.index_score(&score).await?;
                let change = Self::level_change(previous_level, score.level);
                return Ok(ScoreUpdate {
                    score,
                    leveled_up: change.leveled_up,
                    new_level: change.new_level,
                });
            }
            debug!(user_id, attempt, "score update lost a compare-and-swap race, retrying");
        }
        Err(anyhow!("too much contention updating score for user {user_id}"))
    }

    async fn index_score(&self, score: &UserScore) -> Result<()> {
        let pairs = [
            (LeaderboardKind::Guesser, Timeframe::AllTime, score.guesser_points),
            (LeaderboardKind::Liar, Timeframe::AllTime, score.liar_points),
            (LeaderboardKind::Guesser, Timeframe::Weekly, score.weekly_guesser_points),
            (LeaderboardKind::Liar, Timeframe::Weekly, score.weekly_liar_points),
        ];
        for (kind, timeframe, points) in pairs {
            let key = Self::leaderboard_key(kind, timeframe);
            self.store.zadd(&key, &score.user_id, points as i64).await?;
        }
        Ok(())
    }
}
