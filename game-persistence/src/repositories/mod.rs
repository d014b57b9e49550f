pub mod post_repository;
pub mod score_repository;

pub use post_repository::PostRepository;
pub use score_repository::{LevelChange, ScoreRepository, ScoreUpdate};
