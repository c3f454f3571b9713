//! Reprise CLI
//!
//! Terminal flashcards: add cards, study due cards with undo, and check
//! progress.

mod settings;
mod study;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use reprise_core::{
    format_interval, Card, FSRSScheduler, NewCard, SqliteStore, StudyConfig, StudyScope,
    StudyStore, ACHIEVEMENTS,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Reprise - spaced repetition flashcards
#[derive(Parser)]
#[command(name = "reprise")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Spaced repetition flashcards on the FSRS memory model")]
struct Cli {
    /// Directory holding reprise.db (defaults to the platform data directory)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to reprise.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a card
    Add {
        /// Deck the card belongs to
        #[arg(long, default_value = "default")]
        deck: String,
        /// Prompt side
        front: String,
        /// Answer side
        back: String,
    },

    /// List cards due now, in study order
    Due {
        /// Only this deck
        #[arg(long)]
        deck: Option<String>,
        /// Maximum cards to list
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show when each grade would schedule a card, without changing it
    Preview {
        /// Card ID
        card_id: String,
    },

    /// Study due cards interactively
    Study {
        /// Only this deck
        #[arg(long)]
        deck: Option<String>,
    },

    /// Show card counts
    Stats {
        /// Only this deck
        #[arg(long)]
        deck: Option<String>,
    },

    /// Show streaks, totals and achievements
    Progress,

    /// Print the effective configuration as TOML
    Config {
        /// Print built-in defaults instead of the loaded file
        #[arg(long)]
        default: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let (config, source) = settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Add { deck, front, back } => run_add(cli.data_dir, deck, front, back),
        Commands::Due { deck, limit } => {
            let limit = limit.unwrap_or(config.session.max_cards);
            run_due(cli.data_dir, scope(deck), limit)
        }
        Commands::Preview { card_id } => run_preview(cli.data_dir, &config, &card_id),
        Commands::Study { deck } => run_study(cli.data_dir, &config, scope(deck)),
        Commands::Stats { deck } => run_stats(cli.data_dir, scope(deck)),
        Commands::Progress => run_progress(cli.data_dir, &config),
        Commands::Config { default } => run_config(&config, source, default),
    }
}

fn scope(deck: Option<String>) -> StudyScope {
    deck.map(StudyScope::Deck).unwrap_or_default()
}

fn open_store(data_dir: Option<PathBuf>) -> anyhow::Result<SqliteStore> {
    let path = data_dir.map(|dir| dir.join("reprise.db"));
    SqliteStore::new(path).context("opening study database")
}

/// Run add command
fn run_add(data_dir: Option<PathBuf>, deck: String, front: String, back: String) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let card = Card::from_input(NewCard { deck_id: deck, front, back }, Utc::now());
    store.insert_card(&card)?;

    println!("{} {}", "Added card".green().bold(), card.id());
    Ok(())
}

/// Run due command
fn run_due(data_dir: Option<PathBuf>, scope: StudyScope, limit: usize) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let now = Utc::now();
    let cards = store.due_cards(&scope, now, limit)?;

    println!("{}", format!("=== Due in {} ===", scope).cyan().bold());
    if cards.is_empty() {
        println!("{}", "Nothing due.".dimmed());
        return Ok(());
    }
    for card in cards {
        println!(
            "  {:<11} {:<36} {} [{}]",
            card.memory.state.to_string().yellow(),
            card.id().dimmed(),
            card.front,
            card.deck_id
        );
    }
    Ok(())
}

/// Run preview command
fn run_preview(data_dir: Option<PathBuf>, config: &StudyConfig, card_id: &str) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let card = store
        .get_card(card_id)?
        .with_context(|| format!("card {} not found", card_id))?;
    let scheduler = FSRSScheduler::new(config.scheduler.clone());
    let now = Utc::now();
    let preview = scheduler.preview(&card.memory, now, &preview_rng(config));

    println!("{} {}", "Card".cyan().bold(), card.front);
    println!(
        "{}: {}  {}: {:.2}  {}: {:.2}  {}: {:.0}%",
        "State".white().bold(),
        card.memory.state,
        "Difficulty".white().bold(),
        card.memory.difficulty,
        "Stability".white().bold(),
        card.memory.stability,
        "Recall".white().bold(),
        scheduler.retrievability_at(&card.memory, now) * 100.0
    );
    for rating in reprise_core::Rating::ALL {
        let outcome = preview.get(rating);
        println!(
            "  {} {:<5} -> {:<10} in {}",
            rating.as_u8(),
            rating.name(),
            outcome.memory.state.to_string(),
            format_interval(outcome.memory.due, now)
        );
    }
    Ok(())
}

/// Fuzz source for a one-off preview; a configured seed makes it repeatable
fn preview_rng(config: &StudyConfig) -> ChaCha8Rng {
    match config.session.fuzz_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Run study command
fn run_study(data_dir: Option<PathBuf>, config: &StudyConfig, scope: StudyScope) -> anyhow::Result<()> {
    let store: Arc<dyn StudyStore> = Arc::new(open_store(data_dir)?);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    study::run(store, scope, config, &mut input, &mut out)?;
    Ok(())
}

/// Run stats command
fn run_stats(data_dir: Option<PathBuf>, scope: StudyScope) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let now = Utc::now();
    let stats = store.card_stats(&scope, now)?;
    let today = now.date_naive().and_hms_opt(0, 0, 0).map(|t| t.and_utc());

    println!("{}", format!("=== Cards in {} ===", scope).cyan().bold());
    println!("{}: {}", "Total".white().bold(), stats.total);
    println!("{}: {}", "New".white().bold(), stats.new);
    println!("{}: {}", "Learning".white().bold(), stats.learning);
    println!("{}: {}", "Review".white().bold(), stats.review);
    println!("{}: {}", "Due Now".white().bold(), stats.due);
    println!("{}: {}", "Reviews Logged".white().bold(), store.count_reviews(None)?);
    if let Some(midnight) = today {
        println!("{}: {}", "Reviews Today".white().bold(), store.count_reviews_since(midnight)?);
    }
    Ok(())
}

/// Run progress command
fn run_progress(data_dir: Option<PathBuf>, config: &StudyConfig) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let today = Utc::now().date_naive();
    let progress = store
        .load_progress()?
        .unwrap_or_else(|| reprise_core::UserProgress::with_goal(config.progress.daily_goal));
    let unlocked = store.unlocked_achievements()?;

    println!("{}", "=== Progress ===".cyan().bold());
    println!("{}: {}", "Total Reviewed".white().bold(), progress.total_reviewed);
    println!("{}: {} days", "Current Streak".white().bold(), progress.streak_on(today));
    println!("{}: {} days", "Best Streak".white().bold(), progress.longest_streak);
    let goal = if progress.goal_met(today) {
        "met".green()
    } else {
        "not yet".yellow()
    };
    println!(
        "{}: {}/{} ({})",
        "Today".white().bold(),
        progress.reviewed_on(today),
        progress.daily_goal,
        goal
    );

    println!();
    println!(
        "{}",
        format!("=== Achievements ({}/{}) ===", unlocked.len(), ACHIEVEMENTS.len())
            .yellow()
            .bold()
    );
    for achievement in ACHIEVEMENTS {
        match unlocked.iter().find(|u| u.id == achievement.id) {
            Some(u) => println!(
                "  {} {:<14} {} ({})",
                "✓".green(),
                achievement.name,
                achievement.description,
                u.unlocked_at.format("%Y-%m-%d")
            ),
            None => println!(
                "  {} {:<14} {}",
                "·".dimmed(),
                achievement.name.dimmed(),
                achievement.description.dimmed()
            ),
        }
    }
    Ok(())
}

/// Run config command
fn run_config(config: &StudyConfig, source: Option<PathBuf>, default: bool) -> anyhow::Result<()> {
    if default {
        print!("{}", settings::to_toml(&StudyConfig::default())?);
        return Ok(());
    }
    match source {
        Some(path) => eprintln!("# loaded from {}", path.display()),
        None => match settings::default_config_path() {
            Some(path) => eprintln!("# defaults ({} not found)", path.display()),
            None => eprintln!("# defaults"),
        },
    }
    print!("{}", settings::to_toml(config)?);
    Ok(())
}
