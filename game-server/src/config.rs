use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub subreddit_name: String,
    pub leaderboard_limit: usize,
    pub flair_sync_minutes: u64,
}

impl Config {
    pub fn new() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("Invalid PORT"),
            subreddit_name: env::var("SUBREDDIT_NAME")
                .unwrap_or_else(|_| "twotruthsonelie".to_string()),
            leaderboard_limit: env::var("LEADERBOARD_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("Invalid LEADERBOARD_LIMIT"),
            flair_sync_minutes: env::var("FLAIR_SYNC_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .expect("Invalid FLAIR_SYNC_MINUTES"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
