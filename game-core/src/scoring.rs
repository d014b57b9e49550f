use rand::Rng;

/// Every guess earns this much experience, right or wrong.
pub const XP_PER_GUESS: u32 = 1;
/// Additional experience for spotting the lie.
pub const XP_CORRECT_BONUS: u32 = 1;
/// Guesser points for a correct guess. Incorrect guesses earn none.
pub const POINTS_CORRECT_GUESS: u32 = 1;
/// Liar points awarded to the author each time their lie goes unspotted.
pub const LIAR_POINTS_PER_MISS: u32 = 1;

pub fn experience_for_guess(is_correct: bool) -> u32 {
    if is_correct {
        XP_PER_GUESS + XP_CORRECT_BONUS
    } else {
        XP_PER_GUESS
    }
}

pub fn guesser_points_for_guess(is_correct: bool) -> u32 {
    if is_correct { POINTS_CORRECT_GUESS } else { 0 }
}

/// Pick the display slot for the lie when a post is created.
pub fn pick_lie_index() -> u8 {
    rand::thread_rng().gen_range(0..3)
}
