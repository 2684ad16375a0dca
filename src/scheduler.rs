use std::sync::Arc;

use chrono::NaiveDate;
use itertools::{Either, Itertools};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::achievements::{self, Achievement, AchievementStatus, ProgressSnapshot};
use crate::catalog::{Catalog, WordDefinition};
use crate::error::{Result, UnknownTermSnafu};
use crate::quality::Quality;
use crate::stats::{PlayerStats, StreakState};
use crate::storage::{self, PLAYER_STATS_KEY, Storage, WORD_STATES_KEY, WordStates, save_record};
use crate::word_state::WordState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Cap on never-passed words offered per session.
    pub new_words_per_session: usize,
    /// Size of the weakest-words set used when nothing is due.
    pub fallback_set_size: usize,
    /// Fixed shuffle seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            new_words_per_session: 5,
            fallback_set_size: 6,
            seed: None,
        }
    }
}

/// Source of the current calendar date.
#[derive(Clone)]
pub struct Clock(pub Arc<dyn Fn() -> NaiveDate + Send + Sync>);

impl Clock {
    pub fn system() -> Self {
        Self(Arc::new(|| chrono::Local::now().date_naive()))
    }

    pub fn fixed(date: NaiveDate) -> Self {
        Self(Arc::new(move || date))
    }

    pub fn today(&self) -> NaiveDate {
        (self.0)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Clock(<function>)")
    }
}

/// What a recorded attempt did to its word.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    pub state: WordState,
    pub passed: bool,
    /// First passing attempt for this word
    pub newly_learned: bool,
}

/// Owns all word states and player stats for one learner and writes them back through
/// `S` after every change. Storage failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct ReviewScheduler<S: Storage> {
    catalog: Catalog,
    word_states: WordStates,
    stats: PlayerStats,
    storage: S,
    clock: Clock,
    rng: StdRng,
    config: SchedulerConfig,
    pending_unlocks: Vec<Achievement>,
}

impl<S: Storage> ReviewScheduler<S> {
    /// Loads saved progress from `storage` (falling back to a fresh start) and initializes
    /// every catalog word.
    pub fn open(catalog: Catalog, storage: S, config: SchedulerConfig, clock: Clock) -> Self {
        let (word_states, stats) = storage::load_or_default(&storage);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut scheduler = Self {
            catalog,
            word_states,
            stats,
            storage,
            clock,
            rng,
            config,
            pending_unlocks: vec![],
        };
        scheduler.initialize();
        scheduler
    }

    /// Creates default states for catalog words that have none and resets a lapsed
    /// streak. Existing states are left alone, so this is safe to call repeatedly.
    pub fn initialize(&mut self) {
        let today = self.today();
        let mut created = 0;
        for word in self.catalog.iter() {
            if !self.word_states.contains_key(&word.term) {
                self.word_states
                    .insert(word.term.clone(), WordState::new(today));
                created += 1;
            }
        }
        if self.stats.refresh_streak(today) {
            info!("streak lapsed, last practice on {:?}", self.stats.last_played_date);
        }
        self.evaluate_achievements();
        info!(
            "initialized {} words ({} new), {} stored states",
            self.catalog.len(),
            created,
            self.word_states.len()
        );
        self.persist_word_states();
        self.persist_stats();
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    pub fn record_attempt(&mut self, term: &str, quality: Quality) -> Result<AttemptOutcome> {
        let today = self.today();
        self.record_attempt_on(term, quality, today)
    }

    /// Applies one review of `term` as of `today`. Unknown terms leave all state untouched.
    pub fn record_attempt_on(
        &mut self,
        term: &str,
        quality: Quality,
        today: NaiveDate,
    ) -> Result<AttemptOutcome> {
        let state = match self.word_states.get_mut(term) {
            Some(state) if self.catalog.contains(term) => state,
            _ => return UnknownTermSnafu { term }.fail(),
        };
        let was_learned = state.is_learned();
        *state = state.review(quality, today);
        let outcome = AttemptOutcome {
            state: state.clone(),
            passed: quality.is_pass(),
            newly_learned: !was_learned && state.is_learned(),
        };
        debug!(
            "{term} q={quality}: score={} interval={} ease={:.2} next={}",
            outcome.state.score,
            outcome.state.interval,
            outcome.state.ease_factor,
            outcome.state.next_review
        );
        self.persist_word_states();

        let mut stats_changed = false;
        if outcome.newly_learned {
            self.stats.words_learned = self.stats.words_learned.saturating_add(1);
            stats_changed = true;
        }
        if quality.is_perfect() {
            self.stats.perfect_words = self.stats.perfect_words.saturating_add(1);
            stats_changed = true;
        }
        if self.evaluate_achievements() || stats_changed {
            self.persist_stats();
        }
        Ok(outcome)
    }

    /// Due words (shuffled) followed by at most `new_words_per_session` shuffled new words.
    /// A word is due once its review date has come; it is new until it has been passed once.
    pub fn get_due_words(&mut self, today: NaiveDate) -> Vec<WordDefinition> {
        let (mut due, mut fresh): (Vec<_>, Vec<_>) = self
            .catalog
            .iter()
            .filter_map(|word| {
                let state = self.word_states.get(&word.term)?;
                state.is_due(today).then_some((word, state))
            })
            .partition_map(|(word, state)| {
                if state.is_learned() {
                    Either::Left(word.clone())
                } else {
                    Either::Right(word.clone())
                }
            });
        due.shuffle(&mut self.rng);
        fresh.shuffle(&mut self.rng);
        fresh.truncate(self.config.new_words_per_session);
        due.extend(fresh);
        due
    }

    /// The due words, or when none are due the weakest words of the catalog so a
    /// session is never empty.
    pub fn get_practice_set(&mut self, today: NaiveDate) -> Vec<WordDefinition> {
        let due = self.get_due_words(today);
        if !due.is_empty() {
            return due;
        }
        self.catalog
            .iter()
            .sorted_by_key(|word| self.word_score(&word.term))
            .take(self.config.fallback_set_size)
            .cloned()
            .collect()
    }

    /// Adds XP and returns the new level if it went up.
    pub fn add_xp(&mut self, amount: u64) -> Option<u32> {
        let before = self.stats.level();
        self.stats.add_xp(amount);
        let after = self.stats.level();
        self.evaluate_achievements();
        self.persist_stats();
        if after > before {
            info!("level up: {before} -> {after} ({} xp)", self.stats.total_xp);
            Some(after)
        } else {
            None
        }
    }

    pub fn level(&self) -> u32 {
        self.stats.level()
    }

    pub fn xp_for_next_level(&self) -> u64 {
        self.stats.xp_for_next_level()
    }

    pub fn level_progress(&self) -> f64 {
        self.stats.level_progress()
    }

    /// Returns achievements unlocked since the previous call, each exactly once.
    pub fn check_achievements(&mut self) -> Vec<Achievement> {
        if self.evaluate_achievements() {
            self.persist_stats();
        }
        std::mem::take(&mut self.pending_unlocks)
    }

    /// Counts a practice session for `today`. Returns false if today was already counted.
    pub fn record_daily_practice(&mut self, today: NaiveDate) -> bool {
        if !self.stats.record_daily_practice(today) {
            return false;
        }
        info!(
            "practice recorded for {today}: streak {}, session {}",
            self.stats.daily_streak, self.stats.total_sessions
        );
        self.evaluate_achievements();
        self.persist_stats();
        true
    }

    pub fn streak_state(&self, today: NaiveDate) -> StreakState {
        self.stats.streak_state(today)
    }

    pub fn word_state(&self, term: &str) -> Option<WordState> {
        self.word_states.get(term).cloned()
    }

    /// Mastery score, 0 for unknown terms.
    pub fn word_score(&self, term: &str) -> u8 {
        self.word_states.get(term).map_or(0, |s| s.score)
    }

    pub fn stats(&self) -> PlayerStats {
        self.stats.clone()
    }

    pub fn achievements(&self) -> Vec<AchievementStatus> {
        achievements::all_statuses(&self.stats)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn learned_in_catalog(&self) -> usize {
        self.catalog
            .iter()
            .filter(|word| {
                self.word_states
                    .get(&word.term)
                    .is_some_and(WordState::is_learned)
            })
            .count()
    }

    /// Records every achievement whose predicate now holds and queues it for
    /// `check_achievements`. Returns whether anything was unlocked.
    fn evaluate_achievements(&mut self) -> bool {
        let learned = self.learned_in_catalog();
        let progress = ProgressSnapshot::new(&self.stats, self.catalog.len(), learned);
        let earned = achievements::newly_earned(&progress);
        for achievement in &earned {
            info!("achievement unlocked: {achievement}");
            self.stats.achievements.push(achievement.id().to_owned());
        }
        let unlocked = !earned.is_empty();
        self.pending_unlocks.extend(earned);
        unlocked
    }

    fn persist_word_states(&mut self) {
        if let Err(e) = save_record(&mut self.storage, WORD_STATES_KEY, &self.word_states) {
            warn!("could not save word states: {e}");
        }
    }

    fn persist_stats(&mut self) {
        if let Err(e) = save_record(&mut self.storage, PLAYER_STATS_KEY, &self.stats) {
            warn!("could not save player stats: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::ReviewError;
    use crate::catalog::default_catalog;
    use crate::storage::{MemoryStorage, load_record};
    use crate::test_helpers::{catalog_of, day, open_test, q};

    #[test]
    fn initialize_creates_default_states_once() -> Result<()> {
        let today = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(3), today);
        assert_eq!(scheduler.word_state("w0"), Some(WordState::new(today)));

        scheduler.record_attempt("w0", Quality::PERFECT)?;
        let reviewed = scheduler.word_state("w0");
        scheduler.set_clock(Clock::fixed(day(2024, 6, 9)));
        scheduler.initialize();
        assert_eq!(scheduler.word_state("w0"), reviewed);
        assert_eq!(scheduler.word_state("w1"), Some(WordState::new(today)));
        Ok(())
    }

    #[test]
    fn unknown_term_is_rejected_without_side_effects() {
        let today = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(3), today);
        let before = scheduler.stats();
        let err = scheduler
            .record_attempt("nope", Quality::PERFECT)
            .unwrap_err();
        assert!(matches!(err, ReviewError::UnknownTerm { ref term } if term == "nope"));
        assert_eq!(scheduler.stats(), before);
        assert_eq!(scheduler.word_state("nope"), None);
        assert_eq!(scheduler.word_score("nope"), 0);
    }

    #[test]
    fn attempts_update_counters() -> Result<()> {
        let today = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(3), today);

        let outcome = scheduler.record_attempt("w0", q(3)?)?;
        assert!(outcome.passed && outcome.newly_learned);
        let outcome = scheduler.record_attempt("w0", Quality::PERFECT)?;
        assert!(!outcome.newly_learned);
        let outcome = scheduler.record_attempt("w1", q(1)?)?;
        assert!(!outcome.passed && !outcome.newly_learned);

        let stats = scheduler.stats();
        assert_eq!(stats.words_learned, 1);
        assert_eq!(stats.perfect_words, 1);
        assert_eq!(scheduler.word_score("w0"), 1);
        Ok(())
    }

    #[test]
    fn attempts_are_persisted() -> Result<()> {
        let today = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(2), today);
        scheduler.record_attempt("w1", Quality::PERFECT)?;
        let stored: Option<WordStates> = load_record(scheduler.storage(), WORD_STATES_KEY)?;
        assert_eq!(
            stored.and_then(|s| s.get("w1").cloned()),
            scheduler.word_state("w1")
        );
        Ok(())
    }

    #[test]
    fn due_words_come_before_capped_new_words() -> Result<()> {
        let today = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(20), today);
        // two learned words with a failed review are due again today
        for term in ["w3", "w7"] {
            scheduler.record_attempt(term, q(3)?)?;
            scheduler.record_attempt(term, q(0)?)?;
        }
        // learned but scheduled for tomorrow
        scheduler.record_attempt("w9", Quality::PERFECT)?;

        let words = scheduler.get_due_words(today);
        assert_eq!(words.len(), 7);
        let head = words[..2]
            .iter()
            .map(|w| w.term.as_str())
            .collect::<HashSet<_>>();
        assert_eq!(head, HashSet::from(["w3", "w7"]));
        assert!(words.iter().all(|w| w.term != "w9"));
        assert!(
            words[2..]
                .iter()
                .all(|w| scheduler.word_state(&w.term).unwrap().times_correct == 0)
        );
        Ok(())
    }

    #[test]
    fn new_word_cap_holds_for_large_catalogs() {
        let today = day(2024, 6, 1);
        for size in [0, 1, 5, 6, 200] {
            let mut scheduler = open_test(catalog_of(size), today);
            for _ in 0..3 {
                let words = scheduler.get_due_words(today);
                assert_eq!(words.len(), size.min(5));
            }
        }
    }

    #[test]
    fn shuffle_is_seeded() {
        let today = day(2024, 6, 1);
        let mut a = open_test(catalog_of(30), today);
        let mut b = open_test(catalog_of(30), today);
        assert_eq!(a.get_due_words(today), b.get_due_words(today));
    }

    #[test]
    fn practice_set_falls_back_to_weakest_words() -> Result<()> {
        let today = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(9), today);
        // pass everything once so nothing is due today
        for i in 0..9 {
            scheduler.record_attempt(&format!("w{i}"), Quality::PERFECT)?;
        }
        for term in ["w0", "w2", "w4"] {
            scheduler.record_attempt_on(term, Quality::PERFECT, today)?;
        }
        assert!(scheduler.get_due_words(today).is_empty());

        let set = scheduler.get_practice_set(today);
        let terms = set.iter().map(|w| w.term.as_str()).collect::<Vec<_>>();
        assert_eq!(terms, ["w1", "w3", "w5", "w6", "w7", "w8"]);
        let scores = set
            .iter()
            .map(|w| scheduler.word_score(&w.term))
            .collect::<Vec<_>>();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
        Ok(())
    }

    #[test]
    fn practice_set_prefers_due_words() {
        let today = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(8), today);
        let set = scheduler.get_practice_set(today);
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn xp_and_levels() {
        let today = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(1), today);
        assert_eq!(scheduler.level(), 1);
        assert_eq!(scheduler.xp_for_next_level(), 100);
        assert_eq!(scheduler.add_xp(99), None);
        assert_eq!(scheduler.add_xp(1), Some(2));
        assert_eq!(scheduler.xp_for_next_level(), 400);
        assert_eq!(scheduler.add_xp(150), None);
        assert_eq!(scheduler.level_progress(), 0.5);
        assert_eq!(scheduler.add_xp(150), Some(3));
    }

    #[test]
    fn achievements_unlock_once() {
        let today = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(3), today);
        assert!(scheduler.check_achievements().is_empty());

        scheduler.record_daily_practice(today);
        scheduler.add_xp(1000);
        assert_eq!(
            scheduler.check_achievements(),
            [Achievement::FirstSession, Achievement::Xp1000]
        );
        assert!(scheduler.check_achievements().is_empty());
        scheduler.add_xp(1);
        assert!(scheduler.check_achievements().is_empty());
        assert_eq!(
            scheduler.stats().achievements,
            ["first_session", "xp_1000"]
        );
        let unlocked = scheduler
            .achievements()
            .into_iter()
            .filter(|s| s.unlocked)
            .count();
        assert_eq!(unlocked, 2);
        scheduler.add_xp(600);
        assert_eq!(scheduler.check_achievements(), [Achievement::Level5]);
    }

    #[test]
    fn learning_the_whole_catalog() -> Result<()> {
        let today = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(2), today);
        scheduler.record_attempt("w0", q(4)?)?;
        assert!(scheduler.check_achievements().is_empty());
        scheduler.record_attempt("w1", q(3)?)?;
        assert_eq!(scheduler.check_achievements(), [Achievement::AllWords]);
        Ok(())
    }

    #[test]
    fn daily_practice_once_per_day() {
        let mut scheduler = open_test(catalog_of(1), day(2024, 6, 1));
        assert!(scheduler.record_daily_practice(day(2024, 6, 1)));
        assert!(!scheduler.record_daily_practice(day(2024, 6, 1)));
        assert!(scheduler.record_daily_practice(day(2024, 6, 2)));
        assert!(scheduler.record_daily_practice(day(2024, 6, 3)));
        let stats = scheduler.stats();
        assert_eq!((stats.daily_streak, stats.total_sessions), (3, 3));
        assert_eq!(
            scheduler.check_achievements(),
            [Achievement::FirstSession, Achievement::Streak3]
        );
    }

    #[test]
    fn reopening_after_a_gap_resets_the_streak() {
        let first = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(1), first);
        scheduler.record_daily_practice(first);
        scheduler.record_daily_practice(day(2024, 6, 2));
        let storage = scheduler.into_storage();

        let later = day(2024, 6, 5);
        let mut scheduler = ReviewScheduler::open(
            catalog_of(1),
            storage,
            SchedulerConfig::test(),
            Clock::fixed(later),
        );
        assert_eq!(scheduler.stats().daily_streak, 0);
        assert_eq!(scheduler.streak_state(later), StreakState::Broken);
        scheduler.record_daily_practice(later);
        assert_eq!(scheduler.stats().daily_streak, 1);
        assert_eq!(scheduler.stats().total_sessions, 3);
    }

    #[test]
    fn reloaded_state_behaves_like_the_live_state() -> Result<()> {
        let today = day(2024, 6, 1);
        let mut live = open_test(default_catalog(), today);
        for (term, quality) in [("水", 5), ("水", 4), ("火", 2), ("水", 5), ("山", 3)] {
            live.record_attempt(term, q(quality)?)?;
        }
        live.add_xp(230);
        live.record_daily_practice(today);

        let mut reloaded = ReviewScheduler::open(
            default_catalog(),
            live.storage().clone(),
            SchedulerConfig::test(),
            Clock::fixed(today),
        );
        assert_eq!(reloaded.stats(), live.stats());

        let later = day(2024, 6, 20);
        for (term, quality) in [("水", 5), ("火", 4), ("山", 1)] {
            assert_eq!(
                reloaded.record_attempt_on(term, q(quality)?, later)?,
                live.record_attempt_on(term, q(quality)?, later)?
            );
        }
        assert_eq!(reloaded.stats(), live.stats());
        Ok(())
    }

    #[test]
    fn out_of_range_saved_state_restarts_the_word() -> Result<()> {
        let today = day(2024, 6, 1);
        let mut storage = MemoryStorage::new();
        storage.insert(
            WORD_STATES_KEY,
            r#"{"水": {"score": 255, "interval": 4, "nextReview": "2024-05-30",
                      "easeFactor": 0.2, "timesCorrect": 7, "timesMistaken": 2}}"#,
        );
        let mut scheduler = ReviewScheduler::open(
            default_catalog(),
            storage,
            SchedulerConfig::test(),
            Clock::fixed(today),
        );
        assert_eq!(scheduler.word_state("水"), Some(WordState::new(today)));

        let outcome = scheduler.record_attempt("水", Quality::PERFECT)?;
        assert_eq!(outcome.state.score, 1);
        assert_eq!(outcome.state.interval, 1);
        assert!(outcome.newly_learned);
        Ok(())
    }

    #[test]
    fn corrupt_storage_starts_fresh() {
        let today = day(2024, 6, 1);
        let mut storage = MemoryStorage::new();
        storage.insert(WORD_STATES_KEY, "{not json");
        storage.insert(PLAYER_STATS_KEY, "null");
        let scheduler = ReviewScheduler::open(
            catalog_of(2),
            storage,
            SchedulerConfig::test(),
            Clock::fixed(today),
        );
        assert_eq!(scheduler.word_state("w0"), Some(WordState::new(today)));
        assert_eq!(scheduler.stats(), PlayerStats::default());
    }

    #[test]
    fn states_for_removed_words_are_kept_but_never_served() -> Result<()> {
        let today = day(2024, 6, 1);
        let mut scheduler = open_test(catalog_of(3), today);
        scheduler.record_attempt("w2", q(5)?)?;
        let storage = scheduler.into_storage();

        let mut scheduler = ReviewScheduler::open(
            catalog_of(2),
            storage,
            SchedulerConfig::test(),
            Clock::fixed(today),
        );
        assert!(scheduler.word_state("w2").is_some());
        assert!(scheduler.record_attempt("w2", q(5)?).is_err());
        assert!(
            scheduler
                .get_practice_set(day(2024, 7, 1))
                .iter()
                .all(|w| w.term != "w2")
        );
        Ok(())
    }
}
