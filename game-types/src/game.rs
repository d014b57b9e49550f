use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One of the three statements attached to a game post. Immutable once the
/// post is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Statement {
    pub text: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PostType {
    Game,
    Pinned,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Game => "game",
            PostType::Pinned => "pinned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "game" => Some(PostType::Game),
            "pinned" => Some(PostType::Pinned),
            _ => None,
        }
    }
}

/// A single round of Two Truths One Lie. The three statements are stored in
/// their semantic slots; `lie_index` records which *display* position holds
/// the lie, so the shuffled order can always be rebuilt without persisting a
/// separate array.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GamePost {
    pub post_id: String,
    pub author_id: String,
    pub author_username: String,
    pub truth1: Statement,
    pub truth2: Statement,
    pub lie: Statement,
    pub lie_index: u8,
    pub created_at: String, // ISO 8601 string
    pub total_guesses: u32,
    pub correct_guesses: u32,
    pub guess_breakdown: [u32; 3],
}

impl GamePost {
    /// Rebuild the display order: the lie sits at `lie_index`, the two
    /// truths fill the remaining slots in their original order.
    pub fn displayed_statements(&self) -> [&Statement; 3] {
        let mut slots = [&self.truth1; 3];
        let mut truths = [&self.truth1, &self.truth2].into_iter();
        for (i, slot) in slots.iter_mut().enumerate() {
            if i == self.lie_index as usize {
                *slot = &self.lie;
            } else {
                *slot = truths.next().expect("two truth slots");
            }
        }
        slots
    }

    pub fn is_lie(&self, display_index: u8) -> bool {
        display_index == self.lie_index
    }
}

/// A player's single guess on a post. At most one exists per
/// `(post_id, user_id)` pair; a second attempt is rejected, never
/// overwritten.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserGuess {
    pub user_id: String,
    pub username: String,
    pub post_id: String,
    pub guess_index: u8,
    pub is_correct: bool,
    pub timestamp: String, // ISO 8601 string
}

/// Community-level configuration, written once at install time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameSettings {
    pub subreddit_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(text: &str) -> Statement {
        Statement {
            text: text.to_string(),
            description: None,
        }
    }

    fn post_with_lie_at(lie_index: u8) -> GamePost {
        GamePost {
            post_id: "t3_abc".to_string(),
            author_id: "t2_author".to_string(),
            author_username: "author".to_string(),
            truth1: statement("first truth"),
            truth2: statement("second truth"),
            lie: statement("the lie"),
            lie_index,
            created_at: "2026-01-05T00:00:00Z".to_string(),
            total_guesses: 0,
            correct_guesses: 0,
            guess_breakdown: [0, 0, 0],
        }
    }

    #[test]
    fn display_order_places_lie_at_index() {
        for lie_index in 0..3u8 {
            let post = post_with_lie_at(lie_index);
            let displayed = post.displayed_statements();

            assert_eq!(displayed[lie_index as usize].text, "the lie");

            // The truths keep their original relative order.
            let truths: Vec<&str> = displayed
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != lie_index as usize)
                .map(|(_, s)| s.text.as_str())
                .collect();
            assert_eq!(truths, vec!["first truth", "second truth"]);
        }
    }

    #[test]
    fn exactly_one_displayed_statement_is_the_lie() {
        let post = post_with_lie_at(1);
        let lies = (0..3u8).filter(|i| post.is_lie(*i)).count();
        assert_eq!(lies, 1);
    }

    #[test]
    fn post_type_round_trips_through_storage_tag() {
        assert_eq!(PostType::parse(PostType::Game.as_str()), Some(PostType::Game));
        assert_eq!(PostType::parse(PostType::Pinned.as_str()), Some(PostType::Pinned));
        assert_eq!(PostType::parse("unknown"), None);
    }
}
