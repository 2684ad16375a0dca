mod achievements;
mod catalog;
mod error;
mod quality;
mod scheduler;
mod stats;
mod storage;
#[cfg(test)]
mod test_helpers;
mod word_state;

pub use achievements::{Achievement, AchievementRule, AchievementStatus, ProgressSnapshot};
pub use catalog::{Catalog, WordDefinition, default_catalog};
pub use error::{ReviewError, Result};
pub use quality::{PASSING_QUALITY, Quality};
pub use scheduler::{AttemptOutcome, Clock, ReviewScheduler, SchedulerConfig};
pub use stats::{PlayerStats, StreakState, level_for_xp, level_progress, xp_threshold};
pub use storage::{
    FileStorage, MemoryStorage, PLAYER_STATS_KEY, Storage, WORD_STATES_KEY, WordStates,
    load_record, save_record,
};
pub use word_state::{INITIAL_EASE, MAX_SCORE, MIN_EASE, WordState, next_ease, next_interval};
