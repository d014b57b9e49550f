use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone)]
pub struct SubmittedPost {
    pub id: String,
    pub url: String,
}

/// Capability interface over the hosting platform's identity, post,
/// flair and messaging APIs. The core only ever talks to the platform
/// through this trait.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Username of the acting user, if the platform knows one.
    async fn get_current_user(&self) -> Result<Option<String>>;

    async fn submit_post(&self, subreddit: &str, title: &str) -> Result<SubmittedPost>;

    async fn set_user_flair(
        &self,
        subreddit: &str,
        username: &str,
        text: &str,
        background_color: &str,
    ) -> Result<()>;

    async fn send_private_message(&self, to: &str, subject: &str, text: &str) -> Result<()>;

    async fn subscribe_to_subreddit(&self, subreddit: &str) -> Result<()>;
}

/// Fire-and-forget deferred invocation, decoupling flair updates and
/// level-up notifications from the synchronous request path.
#[async_trait]
pub trait JobScheduler: Send + Sync {
    async fn run_job(&self, name: &str, data: serde_json::Value) -> Result<()>;
}

/// Stand-in platform for running the server outside the hosting runtime.
/// Logs every outbound call and fabricates post ids.
#[derive(Default)]
pub struct LoggingPlatform {
    next_post_id: AtomicU64,
}

impl LoggingPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlatformClient for LoggingPlatform {
    async fn get_current_user(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn submit_post(&self, subreddit: &str, title: &str) -> Result<SubmittedPost> {
        let serial = self.next_post_id.fetch_add(1, Ordering::Relaxed);
        let id = format!("t3_local{serial}");
        info!(subreddit, title, post_id = %id, "submitting post");
        Ok(SubmittedPost {
            url: format!("https://example.invalid/r/{subreddit}/{id}"),
            id,
        })
    }

    async fn set_user_flair(
        &self,
        subreddit: &str,
        username: &str,
        text: &str,
        background_color: &str,
    ) -> Result<()> {
        info!(subreddit, username, text, background_color, "setting user flair");
        Ok(())
    }

    async fn send_private_message(&self, to: &str, subject: &str, _text: &str) -> Result<()> {
        info!(to, subject, "sending private message");
        Ok(())
    }

    async fn subscribe_to_subreddit(&self, subreddit: &str) -> Result<()> {
        info!(subreddit, "subscribing to subreddit");
        Ok(())
    }
}
