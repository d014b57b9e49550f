use chrono::{DateTime, Utc};

const SECONDS_PER_WEEK: i64 = 7 * 24 * 60 * 60;

/// Week number used to key the weekly leaderboards: whole weeks elapsed
/// since the Unix epoch. The counter never resets, so weekly keys stay
/// unique across year boundaries and `week - 1` always names the previous
/// week. Recomputed on every access, so the weekly keys roll over at the
/// boundary without an explicit reset write.
pub fn week_number(now: DateTime<Utc>) -> u32 {
    (now.timestamp() / SECONDS_PER_WEEK) as u32
}

pub fn current_week_number() -> u32 {
    week_number(Utc::now())
}
