//! FSRS formulas
//!
//! Pure functions over the weight vector. Nothing here knows about cards,
//! clocks or randomness; the scheduler composes these into a review.

use super::scheduler::Rating;
use crate::memory::{MAX_DIFFICULTY, MIN_DIFFICULTY};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Length of the weight vector
pub const WEIGHT_COUNT: usize = 16;

/// Memory-model weight vector
pub type Weights = [f64; WEIGHT_COUNT];

/// Default weights (FSRS-4.5 calibration without the mean-reversion term)
///
/// | index  | meaning                                         |
/// |--------|-------------------------------------------------|
/// | 0..=3  | initial stability for Again, Hard, Good, Easy   |
/// | 4, 5   | initial difficulty base and slope               |
/// | 6      | difficulty step per grade                       |
/// | 7..=9  | recall stability: exp gain, S decay, R gain     |
/// | 10..=13| forget stability: base, D exp, S exp, R gain    |
/// | 14, 15 | Hard penalty, Easy bonus                        |
pub const DEFAULT_WEIGHTS: Weights = [
    0.4872, 1.4003, 3.7145, 13.8206, // initial stability
    5.1618, 1.2298, // initial difficulty
    0.8975, // difficulty step
    1.6474, 0.1367, 1.0461, // recall stability
    2.1072, 0.0793, 0.3246, 1.587, // forget stability
    0.2272, 2.8755, // grade bonus
];

/// Target probability of recall at the due date
pub const DEFAULT_RETENTION: f64 = 0.9;

/// Forgetting curve factor: R = (1 + FACTOR * t / S)^(-EXPONENT)
pub const DEFAULT_DECAY_FACTOR: f64 = 1.0 / 9.0;

/// Forgetting curve exponent
pub const DEFAULT_CURVE_EXPONENT: f64 = 1.0;

/// Stability floor
pub const MIN_STABILITY: f64 = 0.01;

/// Stability ceiling (100 years)
pub const MAX_STABILITY: f64 = 36500.0;

/// Intervals shorter than this (in days) are never fuzzed
pub const FUZZ_THRESHOLD_DAYS: f64 = 2.5;

/// Fuzz contribution per interval band: (start, end, factor)
const FUZZ_RANGES: [(f64, f64, f64); 3] = [
    (2.5, 7.0, 0.15),
    (7.0, 20.0, 0.1),
    (20.0, f64::INFINITY, 0.05),
];

// ============================================================================
// RETRIEVABILITY
// ============================================================================

/// Probability of recall after `elapsed_days` on the default curve
pub fn retrievability(elapsed_days: f64, stability: f64) -> f64 {
    retrievability_with_decay(
        elapsed_days,
        stability,
        DEFAULT_DECAY_FACTOR,
        DEFAULT_CURVE_EXPONENT,
    )
}

/// Probability of recall after `elapsed_days` on a configured curve
pub fn retrievability_with_decay(
    elapsed_days: f64,
    stability: f64,
    decay_factor: f64,
    curve_exponent: f64,
) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    (1.0 + decay_factor * elapsed_days.max(0.0) / stability).powf(-curve_exponent)
}

// ============================================================================
// DIFFICULTY
// ============================================================================

/// D0(G) = w4 - w5 * (G - 3)
pub fn initial_difficulty(weights: &Weights, rating: Rating) -> f64 {
    let d0 = weights[4] - weights[5] * (rating.as_f64() - 3.0);
    d0.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Signed difficulty step for a grade: positive for Again, negative for Easy
pub fn grade_delta(weights: &Weights, rating: Rating) -> f64 {
    -weights[6] * (rating.as_f64() - 3.0)
}

/// D' = clamp(D + delta(G) * (10 - D) / 9, 1, 10)
pub fn next_difficulty(weights: &Weights, difficulty: f64, rating: Rating) -> f64 {
    let step = grade_delta(weights, rating) * (MAX_DIFFICULTY - difficulty) / 9.0;
    (difficulty + step).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

// ============================================================================
// STABILITY
// ============================================================================

/// S0(G), the base table for a first grade
pub fn initial_stability(weights: &Weights, rating: Rating) -> f64 {
    weights[rating.index()].clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Multiplier on stability growth: Hard penalty, Easy bonus, 1 otherwise
pub fn grade_bonus(weights: &Weights, rating: Rating) -> f64 {
    match rating {
        Rating::Hard => weights[14],
        Rating::Easy => weights[15],
        Rating::Again | Rating::Good => 1.0,
    }
}

/// Stability after a successful recall
///
/// S' = S * (1 + e^wa * (11 - D) * S^-wb * (e^((1 - R) * wc) - 1) * bonus(G))
pub fn next_recall_stability(
    weights: &Weights,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    rating: Rating,
) -> f64 {
    let stability = stability.max(MIN_STABILITY);
    let growth = weights[7].exp()
        * (11.0 - difficulty)
        * stability.powf(-weights[8])
        * (((1.0 - retrievability) * weights[9]).exp() - 1.0)
        * grade_bonus(weights, rating);
    (stability * (1.0 + growth)).clamp(MIN_STABILITY, MAX_STABILITY)
}

/// Stability after a lapse
///
/// S' = wd * D^-we * ((S + 1)^wf - 1) * e^(wg * (1 - R))
pub fn next_forget_stability(
    weights: &Weights,
    difficulty: f64,
    stability: f64,
    retrievability: f64,
) -> f64 {
    let s = weights[10]
        * difficulty.powf(-weights[11])
        * ((stability.max(0.0) + 1.0).powf(weights[12]) - 1.0)
        * (weights[13] * (1.0 - retrievability)).exp();
    s.clamp(MIN_STABILITY, MAX_STABILITY)
}

// ============================================================================
// INTERVALS
// ============================================================================

/// Days until retrievability falls to `retention`, unrounded and unclamped
pub fn next_interval(
    stability: f64,
    retention: f64,
    decay_factor: f64,
    curve_exponent: f64,
) -> f64 {
    (stability / decay_factor) * (retention.powf(-1.0 / curve_exponent) - 1.0)
}

/// Whole-day bounds a fuzzed interval is drawn from
pub fn fuzz_range(interval_days: f64, maximum_interval: f64) -> (f64, f64) {
    let mut delta = 1.0;
    for (start, end, factor) in FUZZ_RANGES {
        delta += factor * (interval_days.min(end) - start).max(0.0);
    }
    let max_ivl = (interval_days + delta).round().min(maximum_interval);
    let min_ivl = (interval_days - delta).round().max(2.0).min(max_ivl);
    (min_ivl, max_ivl)
}

/// Spread an interval across its fuzz range using `draw` in [0, 1)
///
/// Intervals under [`FUZZ_THRESHOLD_DAYS`] come back unchanged.
pub fn fuzz_interval(interval_days: f64, maximum_interval: f64, draw: f64) -> f64 {
    if interval_days < FUZZ_THRESHOLD_DAYS {
        return interval_days;
    }
    let (min_ivl, max_ivl) = fuzz_range(interval_days, maximum_interval);
    let fuzzed = (draw.clamp(0.0, 1.0) * (max_ivl - min_ivl + 1.0) + min_ivl).floor();
    fuzzed.clamp(1.0, max_ivl.max(1.0))
}

// ============================================================================
// TESTS
// ============================================================================
