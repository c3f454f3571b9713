//! FSRS (Free Spaced Repetition Scheduler) Module
//!
//! Difficulty / stability / retrievability memory model with a four-state
//! scheduling machine.
//!
//! Reference: https://github.com/open-spaced-repetition/fsrs4anki
//!
//! ## Core Formulas:
//! - Retrievability: R = (1 + t / (9 * S))^(-1)
//! - Interval: t = S / FACTOR * (r^(-1/EXPONENT) - 1), with FACTOR = 1/9, EXPONENT = 1
//! - Difficulty: D' = clamp(D + delta(G) * (10 - D) / 9, 1, 10)
//! - Recall: S' = S * (1 + e^wa * (11 - D) * S^-wb * (e^((1-R) wc) - 1) * bonus(G))
//! - Lapse: S' = wd * D^-we * ((S + 1)^wf - 1) * e^(wg (1 - R))

mod algorithm;
mod scheduler;

pub use algorithm::{
    fuzz_interval,
    fuzz_range,
    grade_bonus,
    grade_delta,
    initial_difficulty,
    initial_stability,
    next_difficulty,
    next_forget_stability,
    next_interval,
    next_recall_stability,
    // Core functions
    retrievability,
    retrievability_with_decay,
    Weights,
    DEFAULT_CURVE_EXPONENT,
    DEFAULT_DECAY_FACTOR,
    DEFAULT_RETENTION,
    // Constants
    DEFAULT_WEIGHTS,
    FUZZ_THRESHOLD_DAYS,
    MAX_STABILITY,
    MIN_STABILITY,
    WEIGHT_COUNT,
};

pub use scheduler::{
    format_interval, next_state, schedule_review, FSRSParameters, FSRSScheduler, PreviewResults,
    Rating, ReviewResult,
};
