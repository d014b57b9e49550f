pub mod keys;
pub mod repositories;
pub mod store;

pub use repositories::{LevelChange, PostRepository, ScoreRepository, ScoreUpdate};
pub use store::{KvStore, MemoryStore, ScoredMember};
