use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use game_persistence::{MemoryStore, PostRepository, ScoreRepository};
use game_server::game_service::GameService;
use game_server::identity::UserContext;
use game_server::jobs::MaintenanceJobs;
use game_server::platform::{JobScheduler, PlatformClient, SubmittedPost};
use game_types::{CreatePostRequest, GameSettings, GuessResponse, Statement};

pub const TEST_SUBREDDIT: &str = "twotruthsonelie";

#[derive(Debug, Clone)]
pub struct FlairCall {
    pub subreddit: String,
    pub username: String,
    pub text: String,
    pub background_color: String,
}

#[derive(Debug, Clone)]
pub struct MessageCall {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Platform stub that records every outbound call for assertions.
#[derive(Default)]
pub struct RecordingPlatform {
    next_post_id: AtomicU64,
    pub flair_calls: Mutex<Vec<FlairCall>>,
    pub messages: Mutex<Vec<MessageCall>>,
    pub subscriptions: Mutex<Vec<String>>,
}

impl RecordingPlatform {
    pub fn flair_for(&self, username: &str) -> Option<FlairCall> {
        self.flair_calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|call| call.username == username)
            .cloned()
    }
}

#[async_trait]
impl PlatformClient for RecordingPlatform {
    async fn get_current_user(&self) -> Result<Option<String>> {
        Ok(None)
    }

    async fn submit_post(&self, subreddit: &str, _title: &str) -> Result<SubmittedPost> {
        let serial = self.next_post_id.fetch_add(1, Ordering::Relaxed);
        let id = format!("t3_test{serial}");
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
        self.flair_calls.lock().unwrap().push(FlairCall {
            subreddit: subreddit.to_string(),
            username: username.to_string(),
            text: text.to_string(),
            background_color: background_color.to_string(),
        });
        Ok(())
    }

    async fn send_private_message(&self, to: &str, subject: &str, text: &str) -> Result<()> {
        self.messages.lock().unwrap().push(MessageCall {
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn subscribe_to_subreddit(&self, subreddit: &str) -> Result<()> {
        self.subscriptions.lock().unwrap().push(subreddit.to_string());
        Ok(())
    }
}

/// Scheduler stub that records jobs instead of running them, so tests can
/// assert on what was enqueued without racing spawned tasks.
#[derive(Default)]
pub struct RecordingScheduler {
    pub jobs: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingScheduler {
    pub fn job_names(&self) -> Vec<String> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl JobScheduler for RecordingScheduler {
    async fn run_job(&self, name: &str, data: serde_json::Value) -> Result<()> {
        self.jobs.lock().unwrap().push((name.to_string(), data));
        Ok(())
    }
}

/// Fully wired service over in-memory storage and recording stubs.
pub struct TestSetup {
    pub posts: Arc<PostRepository>,
    pub scores: Arc<ScoreRepository>,
    pub platform: Arc<RecordingPlatform>,
    pub scheduler: Arc<RecordingScheduler>,
    pub jobs: Arc<MaintenanceJobs>,
    pub service: GameService,
}

impl TestSetup {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let posts = Arc::new(PostRepository::new(store.clone()));
        let scores = Arc::new(ScoreRepository::new(store));
        let platform = Arc::new(RecordingPlatform::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let jobs = Arc::new(MaintenanceJobs::new(
            posts.clone(),
            scores.clone(),
            platform.clone(),
        ));

        let service = GameService::new(
            posts.clone(),
            scores.clone(),
            platform.clone(),
            scheduler.clone(),
        );
        service
            .install(&GameSettings {
                subreddit_name: TEST_SUBREDDIT.to_string(),
            })
            .await
            .unwrap();

        Self {
            posts,
            scores,
            platform,
            scheduler,
            jobs,
            service,
        }
    }

    /// Creates a game post and returns its id and lie display index.
    pub async fn create_post(&self, author: &UserContext) -> (String, u8) {
        let response = self
            .service
            .create_game_post(author, create_post_request())
            .await
            .unwrap();
        let post = self
            .posts
            .get_game_post(&response.post_id)
            .await
            .unwrap()
            .unwrap();
        (response.post_id, post.lie_index)
    }

    pub async fn guess(
        &self,
        guesser: &UserContext,
        post_id: &str,
        guess_index: u8,
    ) -> Result<GuessResponse, game_types::GameError> {
        self.service
            .submit_guess(
                guesser,
                game_types::GuessRequest {
                    post_id: post_id.to_string(),
                    guess_index,
                },
            )
            .await
    }
}

pub fn test_user(name: &str) -> UserContext {
    UserContext {
        user_id: format!("t2_{}", name.to_lowercase()),
        username: name.to_string(),
    }
}

pub fn statement(text: &str) -> Statement {
    Statement {
        text: text.to_string(),
        description: None,
    }
}

pub fn create_post_request() -> CreatePostRequest {
    CreatePostRequest {
        truth1: statement("I have run a marathon"),
        truth2: statement("I speak three languages"),
        lie: statement("I have met an astronaut"),
    }
}

/// A display index that is not the lie.
pub fn wrong_index(lie_index: u8) -> u8 {
    (lie_index + 1) % 3
}
