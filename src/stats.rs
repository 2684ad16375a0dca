use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const XP_PER_LEVEL_UNIT: u64 = 100;

/// Aggregate player progress. Field names follow the persisted `playerStats` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub daily_streak: u32,
    pub last_played_date: Option<NaiveDate>,
    pub words_learned: u32,
    pub perfect_words: u32,
    pub total_sessions: u32,
    /// Unlocked achievement ids, in unlock order
    pub achievements: Vec<String>,
}

impl PlayerStats {
    pub fn level(&self) -> u32 {
        level_for_xp(self.total_xp)
    }

    pub fn xp_for_next_level(&self) -> u64 {
        xp_threshold(self.level())
    }

    pub fn level_progress(&self) -> f64 {
        level_progress(self.total_xp)
    }

    pub fn add_xp(&mut self, amount: u64) {
        self.total_xp = self.total_xp.saturating_add(amount);
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    pub fn streak_state(&self, today: NaiveDate) -> StreakState {
        StreakState::derive(self.last_played_date, self.daily_streak, today)
    }

    /// Zeroes a streak that lapsed before `today`. Returns whether anything changed.
    pub fn refresh_streak(&mut self, today: NaiveDate) -> bool {
        if self.streak_state(today) == StreakState::Broken && self.daily_streak != 0 {
            self.daily_streak = 0;
            return true;
        }
        false
    }

    /// Counts today's practice once. Returns false when today was already counted.
    pub fn record_daily_practice(&mut self, today: NaiveDate) -> bool {
        let streak = match self.streak_state(today) {
            StreakState::Active { practiced_today: true, .. } => return false,
            StreakState::Active { days, .. } => days.saturating_add(1),
            StreakState::NoHistory | StreakState::Broken => 1,
        };
        self.daily_streak = streak;
        self.total_sessions = self.total_sessions.saturating_add(1);
        self.last_played_date = Some(today);
        true
    }
}

/// Where a daily streak stands on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakState {
    NoHistory,
    /// Last practice was today or yesterday.
    Active { days: u32, practiced_today: bool },
    /// A calendar day was skipped, or the last practice date lies in the future.
    Broken,
}

impl StreakState {
    pub fn derive(last_played: Option<NaiveDate>, streak: u32, today: NaiveDate) -> Self {
        let Some(last) = last_played else {
            return Self::NoHistory;
        };
        match (today - last).num_days() {
            0 => Self::Active {
                days: streak,
                practiced_today: true,
            },
            1 => Self::Active {
                days: streak,
                practiced_today: false,
            },
            _ => Self::Broken,
        }
    }
}

/// floor(sqrt(xp / 100)) + 1
pub fn level_for_xp(xp: u64) -> u32 {
    // isqrt of a u64 fits in u32
    ((xp / XP_PER_LEVEL_UNIT).isqrt() + 1) as u32
}

/// Total XP at which `level` is left behind: level² · 100.
pub fn xp_threshold(level: u32) -> u64 {
    u64::from(level).pow(2).saturating_mul(XP_PER_LEVEL_UNIT)
}

/// Fraction of the way from the current level's threshold to the next one, in [0, 1).
pub fn level_progress(xp: u64) -> f64 {
    // u128 so the top level's ceiling does not saturate
    let level = u128::from(level_for_xp(xp));
    let floor = (level - 1).pow(2) * u128::from(XP_PER_LEVEL_UNIT);
    let ceil = level.pow(2) * u128::from(XP_PER_LEVEL_UNIT);
    (u128::from(xp) - floor) as f64 / (ceil - floor) as f64
}
