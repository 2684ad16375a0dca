use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::quality::Quality;

pub const MAX_SCORE: u8 = 5;
pub const INITIAL_EASE: f64 = 2.5;
pub const MIN_EASE: f64 = 1.3;

/// Learning record for one word. Field names follow the persisted `wordStates` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordState {
    /// Mastery, 0..=5
    pub score: u8,
    /// Days until the next review
    pub interval: u32,
    pub next_review: NaiveDate,
    pub ease_factor: f64,
    pub times_correct: u32,
    pub times_mistaken: u32,
}

impl WordState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            score: 0,
            interval: 0,
            next_review: today,
            ease_factor: INITIAL_EASE,
            times_correct: 0,
            times_mistaken: 0,
        }
    }

    pub fn is_learned(&self) -> bool {
        self.times_correct > 0
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review <= today
    }

    /// Score within 0..=5 and a finite ease factor no lower than 1.3.
    pub fn is_valid(&self) -> bool {
        self.score <= MAX_SCORE && self.ease_factor.is_finite() && self.ease_factor >= MIN_EASE
    }

    /// Applies one SM-2 review. The ease factor moves on every review; the interval and
    /// score only move in the direction of the outcome.
    pub fn review(&self, quality: Quality, today: NaiveDate) -> Self {
        let ease_factor = next_ease(self.ease_factor, quality);
        let mut next = Self {
            ease_factor,
            ..self.clone()
        };
        if quality.is_pass() {
            next.interval = next_interval(self.interval, ease_factor);
            if quality.value() >= 4 {
                next.score = self.score.saturating_add(1).min(MAX_SCORE);
            }
            next.times_correct = self.times_correct.saturating_add(1);
        } else {
            next.interval = 0;
            next.score = self.score.saturating_sub(1);
            next.times_mistaken = self.times_mistaken.saturating_add(1);
        }
        next.next_review = today
            .checked_add_days(Days::new(next.interval.into()))
            .unwrap_or(NaiveDate::MAX);
        next
    }
}

pub fn next_ease(ease: f64, quality: Quality) -> f64 {
    let miss = f64::from(5 - quality.value());
    (ease + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE)
}

/// 0 -> 1 -> 6 -> round(interval * ease)
pub fn next_interval(interval: u32, ease: f64) -> u32 {
    match interval {
        0 => 1,
        1 => 6,
        n => (f64::from(n) * ease).round().min(f64::from(u32::MAX)) as u32,
    }
}
