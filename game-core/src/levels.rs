use std::sync::OnceLock;

use game_types::Level;

fn entry(level: u32, name: &str, experience_required: u32, flair_color: &str) -> Level {
    Level {
        level,
        name: name.to_string(),
        experience_required,
        flair_text: format!("Lv{} {}", level, name),
        flair_color: flair_color.to_string(),
    }
}

/// The canonical level table, sorted ascending by experience threshold.
/// The first entry has threshold 0, so every experience value maps to a
/// level.
pub fn level_table() -> &'static [Level] {
    static TABLE: OnceLock<Vec<Level>> = OnceLock::new();
    TABLE.get_or_init(|| {
        vec![
            entry(1, "Newcomer", 0, "#B8B8B8"),
            entry(2, "Rookie Sleuth", 10, "#A3C9A8"),
            entry(3, "Truth Seeker", 25, "#7FB3D5"),
            entry(4, "Lie Detector", 50, "#5499C7"),
            entry(5, "Keen Observer", 100, "#48C9B0"),
            entry(6, "Master Sleuth", 200, "#F4D03F"),
            entry(7, "Deception Expert", 350, "#EB984E"),
            entry(8, "Mind Reader", 550, "#DC7633"),
            entry(9, "Truth Oracle", 800, "#AF7AC5"),
            entry(10, "Legendary Detective", 1100, "#E74C3C"),
        ]
    })
}

/// The highest level whose threshold does not exceed `experience`.
/// Thresholds are inclusive lower bounds: hitting a threshold exactly
/// belongs to the higher level.
pub fn level_for_experience(experience: u32) -> &'static Level {
    let table = level_table();
    table
        .iter()
        .rev()
        .find(|level| level.experience_required <= experience)
        .unwrap_or(&table[0])
}

/// The entry one level above `current_level`, or `None` at the maximum.
pub fn next_level(current_level: u32) -> Option<&'static Level> {
    level_table()
        .iter()
        .find(|level| level.level == current_level + 1)
}

pub fn level_by_number(level: u32) -> Option<&'static Level> {
    level_table().iter().find(|entry| entry.level == level)
}
