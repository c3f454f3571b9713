//! Interactive study loop
//!
//! Reads one command per line: Enter flips the card, 1-4 grades it, `u`
//! undoes the last grade, `r` restarts the session, `q` quits. After the
//! last card, `u` can still take back the final grade.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use colored::Colorize;
use reprise_core::{
    format_interval, Achievement, AchievementTracker, EventBus, Rating, ReviewController, ReviewError,
    SessionSummary, StudyConfig, StudyScope, StudyStore,
};

/// One line of learner input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Flip,
    Grade(i32),
    Undo,
    Restart,
    Quit,
    Unknown,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "" | "f" | "flip" => Input::Flip,
            "u" | "undo" => Input::Undo,
            "r" | "restart" => Input::Restart,
            "q" | "quit" | "exit" => Input::Quit,
            other => other.parse::<i32>().map(Input::Grade).unwrap_or(Input::Unknown),
        }
    }
}

/// Run a session against `store`, reading commands from `input`
pub fn run(
    store: Arc<dyn StudyStore>,
    scope: StudyScope,
    config: &StudyConfig,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> anyhow::Result<SessionSummary> {
    let bus = EventBus::default();
    let mut events = bus.subscribe();
    let tracker = AchievementTracker::new(store.as_ref());
    let mut session = ReviewController::start(store.clone(), scope, Utc::now(), config, bus)?;

    if session.is_complete() {
        writeln!(out, "{}", "No cards due. All caught up!".green())?;
        return Ok(session.summary());
    }

    let mut shown_at = Instant::now();
    // Set on flip; the preview and the grade share this instant
    let mut flipped_at: Option<DateTime<Utc>> = None;
    let mut line = String::new();

    loop {
        match session.current() {
            Some(card) if flipped_at.is_none() => {
                writeln!(out)?;
                writeln!(
                    out,
                    "{} {}/{}",
                    "Card".cyan().bold(),
                    session.queue().position() + 1,
                    session.queue().len()
                )?;
                writeln!(out, "  {}", card.front.white().bold())?;
                write!(out, "{}", "[Enter] flip  [u] undo  [q] quit > ".dimmed())?;
            }
            Some(_) => write!(out, "{}", "Grade 1-4 > ".dimmed())?,
            None => write!(out, "{}", "All cards graded. [u] undo  [Enter] finish > ".dimmed())?,
        }
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let command = Input::parse(&line);
        if session.is_complete() && command != Input::Undo {
            break;
        }

        match command {
            Input::Flip if flipped_at.is_none() => {
                if let Some(card) = session.current() {
                    writeln!(out, "  {}", card.back.green())?;
                }
                let now = Utc::now();
                if let Some(preview) = session.preview(now) {
                    let options: Vec<String> = Rating::ALL
                        .iter()
                        .map(|&r| {
                            format!(
                                "{} {} ({})",
                                r.as_u8(),
                                r.name(),
                                format_interval(preview.get(r).memory.due, now)
                            )
                        })
                        .collect();
                    writeln!(out, "  {}", options.join("   "))?;
                }
                flipped_at = Some(now);
            }
            Input::Flip => {}
            Input::Grade(grade) => {
                let spent = shown_at.elapsed().as_millis() as i64;
                let at = flipped_at.unwrap_or_else(Utc::now);
                match session.grade(grade, spent, at) {
                    Ok(outcome) => {
                        writeln!(
                            out,
                            "  {} next in {}",
                            "Saved,".dimmed(),
                            format_interval(outcome.result.memory.due, outcome.record.reviewed_at)
                        )?;
                        print_unlocks(out, &tracker.drain(&mut events)?)?;
                        flipped_at = None;
                        shown_at = Instant::now();
                    }
                    Err(e @ ReviewError::InvalidGrade(_)) => {
                        writeln!(out, "  {}", e.to_string().red())?;
                    }
                    Err(e) => {
                        writeln!(out, "  {} {}", "Grade not saved:".red(), e)?;
                    }
                }
            }
            Input::Undo => match session.undo(Utc::now()) {
                Ok(undone) => {
                    writeln!(out, "  {} ({})", "Undone".yellow(), undone.rating.name())?;
                    flipped_at = None;
                    shown_at = Instant::now();
                }
                Err(e) => writeln!(out, "  {}", e.to_string().red())?,
            },
            Input::Restart => {
                session.restart(Utc::now());
                flipped_at = None;
                shown_at = Instant::now();
            }
            Input::Quit => break,
            Input::Unknown => {
                writeln!(out, "  {}", "Unknown command".red())?;
            }
        }
    }

    // Drain anything left so unlocks are never missed
    print_unlocks(out, &tracker.drain(&mut events)?)?;

    let summary = session.summary();
    print_summary(out, &summary)?;
    Ok(summary)
}

/// One line per newly unlocked achievement
pub fn print_unlocks(out: &mut dyn Write, unlocked: &[&Achievement]) -> anyhow::Result<()> {
    for achievement in unlocked {
        writeln!(
            out,
            "  {} {}: {}",
            "Achievement unlocked!".yellow().bold(),
            achievement.name,
            achievement.description
        )?;
    }
    Ok(())
}

/// Terminal report
pub fn print_summary(out: &mut dyn Write, summary: &SessionSummary) -> anyhow::Result<()> {
    let stats = &summary.stats;
    writeln!(out)?;
    if summary.completed_at.is_some() {
        writeln!(out, "{}", "=== Session Complete ===".cyan().bold())?;
    } else {
        writeln!(out, "{}", "=== Session Paused ===".cyan().bold())?;
    }
    writeln!(out, "{}: {}/{}", "Reviewed".white().bold(), stats.reviewed, summary.total_cards)?;
    writeln!(out, "{}: {}%", "Accuracy".white().bold(), stats.accuracy_percent())?;
    writeln!(
        out,
        "  {} {}  {} {}  {} {}  {} {}",
        "Again".red(),
        stats.again,
        "Hard".yellow(),
        stats.hard,
        "Good".green(),
        stats.good,
        "Easy".blue(),
        stats.easy
    )?;
    Ok(())
}
