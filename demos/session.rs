use chrono::{Days, Local};
use hanzi_review::{
    Clock, FileStorage, Quality, ReviewScheduler, SchedulerConfig, default_catalog,
};

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

// Simulated learner: longer words get more mistakes, and every seventh attempt uses a hint.
fn simulated_attempt(term: &str, attempt: usize) -> Quality {
    let mistakes = (term.chars().count() as u32 - 1) * 2 + (attempt % 3) as u32;
    Quality::from_attempt(mistakes, attempt % 7 == 6)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger()?;
    let save_dir = std::env::temp_dir().join("hanzi-review-demo");
    let start = Local::now().date_naive();

    let mut scheduler = ReviewScheduler::open(
        default_catalog(),
        FileStorage::new(&save_dir),
        SchedulerConfig::default(),
        Clock::fixed(start),
    );

    let mut attempt = 0;
    for offset in 0..10 {
        let today = start + Days::new(offset);
        scheduler.set_clock(Clock::fixed(today));
        scheduler.record_daily_practice(today);

        let words = scheduler.get_practice_set(today);
        println!("\n{today}: {} words", words.len());
        for word in words {
            let quality = simulated_attempt(&word.term, attempt);
            attempt += 1;
            let outcome = scheduler.record_attempt(&word.term, quality)?;
            if let Some(level) = scheduler.add_xp(quality.xp()) {
                println!("  level up! now level {level}");
            }
            println!(
                "  {} ({}) q={} -> score {} next review {}",
                word.term, word.pinyin, quality, outcome.state.score, outcome.state.next_review
            );
        }
        for achievement in scheduler.check_achievements() {
            println!("  unlocked: {} - {}", achievement.title(), achievement.description());
        }
    }

    let stats = scheduler.stats();
    println!(
        "\nlevel {} ({:.0}% to next), {} xp, streak {}, {} words learned",
        scheduler.level(),
        scheduler.level_progress() * 100.0,
        stats.total_xp,
        stats.daily_streak,
        stats.words_learned
    );
    println!("progress saved in {}", save_dir.display());
    Ok(())
}
