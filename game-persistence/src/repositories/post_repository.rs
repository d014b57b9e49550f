use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use tracing::debug;

use crate::keys;
use crate::store::KvStore;
use game_types::{GamePost, GameSettings, PostType, UserGuess};

const MAX_CAS_ATTEMPTS: usize = 64;

/// Persistence for game posts, guesses, post types and the installed
/// community settings, layered over the key-value capability.
pub struct PostRepository {
    store: Arc<dyn KvStore>,
}

impl PostRepository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Store a freshly created post and tag its type. Posts are created
    /// exactly once; an existing id is a hard error.
    pub async fn create_game_post(&self, post: &GamePost) -> Result<()> {
        let raw = serde_json::to_string(post)?;
        let created = self.store.set_nx(&keys::game_post(&post.post_id), &raw).await?;
        if !created {
            bail!("game post {} already exists", post.post_id);
        }
        self.store
            .set(&keys::post_type(&post.post_id), PostType::Game.as_str())
            .await
    }

    pub async fn get_game_post(&self, post_id: &str) -> Result<Option<GamePost>> {
        match self.store.get(&keys::game_post(post_id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn get_post_type(&self, post_id: &str) -> Result<Option<PostType>> {
        Ok(self
            .store
            .get(&keys::post_type(post_id)).await?
            .and_then(|tag| PostType::parse(&tag)))
    }

    pub async fn set_pinned_post(&self, post_id: &str) -> Result<()> {
        self.store.set(keys::PINNED_POST, post_id).await?;
        self.store
            .set(&keys::post_type(post_id), PostType::Pinned.as_str())
            .await
    }

    pub async fn get_pinned_post(&self) -> Result<Option<String>> {
        self.store.get(keys::PINNED_POST).await
    }

    /// Write the install-time settings once. Returns false when settings
    /// already exist, which leaves the original record untouched.
    pub async fn init_settings(&self, settings: &GameSettings) -> Result<bool> {
        let raw = serde_json::to_string(settings)?;
        self.store.set_nx(keys::GAME_SETTINGS, &raw).await
    }

    pub async fn get_settings(&self) -> Result<Option<GameSettings>> {
        match self.store.get(keys::GAME_SETTINGS).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn get_user_guess(&self, post_id: &str, user_id: &str) -> Result<Option<UserGuess>> {
        match self.store.get(&keys::user_guess(post_id, user_id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Atomic create-if-absent write of a guess record. This is the actual
    /// duplicate-guess guard: scoring only proceeds when this returns true,
    /// so two near-simultaneous guesses from one user cannot both count.
    pub async fn try_record_guess(&self, guess: &UserGuess) -> Result<bool> {
        let raw = serde_json::to_string(guess)?;
        self.store
            .set_nx(&keys::user_guess(&guess.post_id, &guess.user_id), &raw)
            .await
    }

    /// Bump the post tally for one guess under an optimistic
    /// compare-and-swap loop, so concurrent guessers never lose counter
    /// updates.
    pub async fn apply_guess_to_post(
        &self,
        post_id: &str,
        guess_index: u8,
        is_correct: bool,
    ) -> Result<GamePost> {
        let key = keys::game_post(post_id);
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let existing = self
                .store
                .get(&key)
                .await?
                .ok_or_else(|| anyhow!("game post {post_id} not found"))?;
            let mut post: GamePost = serde_json::from_str(&existing)?;

            post.total_guesses += 1;
            post.guess_breakdown[guess_index as usize] += 1;
            if is_correct {
                post.correct_guesses += 1;
            }

            let raw = serde_json::to_string(&post)?;
            if self
                .store
                .compare_and_swap(&key, Some(&existing), &raw)
                .await?
            {
                return Ok(post);
            }
            debug!(post_id, attempt, "post tally lost a compare-and-swap race, retrying");
        }
        Err(anyhow!("too much contention updating post {post_id}"))
    }
}
