use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error::{InvalidQualitySnafu, Result};

/// Attempts with a quality below this count as failures.
pub const PASSING_QUALITY: u8 = 3;

/// Grade of a single writing attempt, 0 (blackout) to 5 (perfect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const PERFECT: Quality = Quality(5);

    pub fn new(quality: u8) -> Result<Self> {
        ensure!(quality <= 5, InvalidQualitySnafu { quality });
        Ok(Self(quality))
    }

    /// Grades a stroke quiz: a hint or six or more mistakes fails the word.
    pub fn from_attempt(mistakes: u32, hint_used: bool) -> Self {
        match (hint_used, mistakes) {
            (true, _) | (_, 6..) => Self(1),
            (false, 3..=5) => Self(3),
            (false, 1..=2) => Self(4),
            (false, 0) => Self(5),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_pass(self) -> bool {
        self.0 >= PASSING_QUALITY
    }

    pub fn is_perfect(self) -> bool {
        self == Self::PERFECT
    }

    /// Default XP award for an attempt of this quality.
    pub fn xp(self) -> u64 {
        match self.0 {
            5 => 20,
            4 => 15,
            3 => 10,
            _ => 2,
        }
    }
}

impl TryFrom<u8> for Quality {
    type Error = crate::ReviewError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
