use serde::Serialize;
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::stats::PlayerStats;

/// Read-only view of everything an achievement predicate may look at.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSnapshot<'a> {
    pub stats: &'a PlayerStats,
    pub level: u32,
    pub catalog_size: usize,
    /// Catalog words with at least one passing attempt
    pub learned_in_catalog: usize,
}

impl<'a> ProgressSnapshot<'a> {
    pub fn new(stats: &'a PlayerStats, catalog_size: usize, learned_in_catalog: usize) -> Self {
        Self {
            stats,
            level: stats.level(),
            catalog_size,
            learned_in_catalog,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstSession,
    #[strum(serialize = "streak_3")]
    #[serde(rename = "streak_3")]
    Streak3,
    #[strum(serialize = "streak_7")]
    #[serde(rename = "streak_7")]
    Streak7,
    #[strum(serialize = "streak_30")]
    #[serde(rename = "streak_30")]
    Streak30,
    #[strum(serialize = "level_5")]
    #[serde(rename = "level_5")]
    Level5,
    #[strum(serialize = "level_10")]
    #[serde(rename = "level_10")]
    Level10,
    #[strum(serialize = "words_10")]
    #[serde(rename = "words_10")]
    Words10,
    #[strum(serialize = "words_50")]
    #[serde(rename = "words_50")]
    Words50,
    #[strum(serialize = "perfect_10")]
    #[serde(rename = "perfect_10")]
    Perfect10,
    #[strum(serialize = "perfect_50")]
    #[serde(rename = "perfect_50")]
    Perfect50,
    #[strum(serialize = "xp_1000")]
    #[serde(rename = "xp_1000")]
    Xp1000,
    #[strum(serialize = "xp_5000")]
    #[serde(rename = "xp_5000")]
    Xp5000,
    AllWords,
}

type Predicate = fn(&ProgressSnapshot) -> bool;

pub struct AchievementRule {
    pub achievement: Achievement,
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: Predicate,
}

static RULES: &[AchievementRule] = &[
    AchievementRule {
        achievement: Achievement::FirstSession,
        title: "First Stroke",
        description: "Finish your first practice session",
        unlocked: |p| p.stats.total_sessions >= 1,
    },
    AchievementRule {
        achievement: Achievement::Streak3,
        title: "Warming Up",
        description: "Practice three days in a row",
        unlocked: |p| p.stats.daily_streak >= 3,
    },
    AchievementRule {
        achievement: Achievement::Streak7,
        title: "One Week Strong",
        description: "Practice seven days in a row",
        unlocked: |p| p.stats.daily_streak >= 7,
    },
    AchievementRule {
        achievement: Achievement::Streak30,
        title: "Calligrapher's Habit",
        description: "Practice thirty days in a row",
        unlocked: |p| p.stats.daily_streak >= 30,
    },
    AchievementRule {
        achievement: Achievement::Level5,
        title: "Apprentice",
        description: "Reach level 5",
        unlocked: |p| p.level >= 5,
    },
    AchievementRule {
        achievement: Achievement::Level10,
        title: "Scholar",
        description: "Reach level 10",
        unlocked: |p| p.level >= 10,
    },
    AchievementRule {
        achievement: Achievement::Words10,
        title: "Vocabulary Seed",
        description: "Learn 10 words",
        unlocked: |p| p.stats.words_learned >= 10,
    },
    AchievementRule {
        achievement: Achievement::Words50,
        title: "Vocabulary Tree",
        description: "Learn 50 words",
        unlocked: |p| p.stats.words_learned >= 50,
    },
    AchievementRule {
        achievement: Achievement::Perfect10,
        title: "Steady Hand",
        description: "Write 10 words perfectly",
        unlocked: |p| p.stats.perfect_words >= 10,
    },
    AchievementRule {
        achievement: Achievement::Perfect50,
        title: "Brush Master",
        description: "Write 50 words perfectly",
        unlocked: |p| p.stats.perfect_words >= 50,
    },
    AchievementRule {
        achievement: Achievement::Xp1000,
        title: "Thousand Strokes",
        description: "Earn 1000 XP",
        unlocked: |p| p.stats.total_xp >= 1000,
    },
    AchievementRule {
        achievement: Achievement::Xp5000,
        title: "Ink Well",
        description: "Earn 5000 XP",
        unlocked: |p| p.stats.total_xp >= 5000,
    },
    AchievementRule {
        achievement: Achievement::AllWords,
        title: "Complete Collection",
        description: "Learn every word in the catalog",
        unlocked: |p| p.catalog_size > 0 && p.learned_in_catalog >= p.catalog_size,
    },
];

impl Achievement {
    pub fn id(self) -> &'static str {
        self.into()
    }

    pub fn rule(self) -> &'static AchievementRule {
        // RULES has one entry per variant, in declaration order
        &RULES[self as usize]
    }

    pub fn title(self) -> &'static str {
        self.rule().title
    }

    pub fn description(self) -> &'static str {
        self.rule().description
    }

    pub fn is_earned(self, progress: &ProgressSnapshot) -> bool {
        (self.rule().unlocked)(progress)
    }
}

impl std::fmt::Display for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// An achievement together with whether the player has it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
}

pub fn all_statuses(stats: &PlayerStats) -> Vec<AchievementStatus> {
    Achievement::iter()
        .map(|achievement| AchievementStatus {
            achievement,
            title: achievement.title(),
            description: achievement.description(),
            unlocked: stats.has_achievement(achievement.id()),
        })
        .collect()
}

/// Achievements whose predicate holds but which `progress.stats` has not recorded yet.
pub fn newly_earned(progress: &ProgressSnapshot) -> Vec<Achievement> {
    Achievement::iter()
        .filter(|a| !progress.stats.has_achievement(a.id()))
        .filter(|a| a.is_earned(progress))
        .collect()
}
