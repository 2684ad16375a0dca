use chrono::NaiveDate;

use crate::catalog::{Catalog, WordDefinition};
use crate::error::Result;
use crate::quality::Quality;
use crate::scheduler::{Clock, ReviewScheduler, SchedulerConfig};
use crate::storage::MemoryStorage;

impl SchedulerConfig {
    pub(crate) fn test() -> Self {
        Self {
            seed: Some(42),
            ..Default::default()
        }
    }
}

pub(crate) fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub(crate) fn q(quality: u8) -> Result<Quality> {
    Quality::new(quality)
}

/// Catalog of `n` placeholder words named `w0`, `w1`, ...
pub(crate) fn catalog_of(n: usize) -> Catalog {
    Catalog::new(
        (0..n)
            .map(|i| WordDefinition::new(format!("w{i}"), format!("p{i}"), 1))
            .collect(),
    )
    .unwrap()
}

pub(crate) fn open_test(catalog: Catalog, today: NaiveDate) -> ReviewScheduler<MemoryStorage> {
    ReviewScheduler::open(
        catalog,
        MemoryStorage::new(),
        SchedulerConfig::test(),
        Clock::fixed(today),
    )
}
