use thiserror::Error;

/// Error taxonomy for the game service. Validation and state-conflict cases
/// carry specific messages; storage failures are surfaced unchanged from
/// the key-value layer.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("{0}")]
    Validation(String),

    #[error("You have already guessed on this post")]
    DuplicateGuess,

    #[error("You cannot guess on your own post")]
    SelfGuess,

    #[error("{0} not found")]
    NotFound(String),

    #[error("This post is not a game post")]
    NotAGamePost,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl GameError {
    pub fn validation(message: impl Into<String>) -> Self {
        GameError::Validation(message.into())
    }
}
