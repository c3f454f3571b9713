//! Property tests for the FSRS scheduler over arbitrary card memories

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use reprise_core::fsrs::{MAX_STABILITY, MIN_STABILITY};
use reprise_core::{next_state, CardMemory, FSRSParameters, FSRSScheduler, LearningState, Rating};

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_718_000_000_000).unwrap()
}

fn any_rating() -> impl Strategy<Value = Rating> {
    prop_oneof![
        Just(Rating::Again),
        Just(Rating::Hard),
        Just(Rating::Good),
        Just(Rating::Easy),
    ]
}

fn any_state() -> impl Strategy<Value = LearningState> {
    prop_oneof![
        Just(LearningState::New),
        Just(LearningState::Learning),
        Just(LearningState::Review),
        Just(LearningState::Relearning),
    ]
}

/// A valid memory as it could come out of the store
fn any_memory() -> impl Strategy<Value = CardMemory> {
    (
        any_state(),
        1.0f64..=10.0,
        0.1f64..1000.0,
        0i64..(400 * 24 * 60),
        1u32..50,
        0u32..10,
    )
        .prop_map(|(state, difficulty, stability, minutes_ago, reps, lapses)| {
            if state == LearningState::New {
                return CardMemory::new("prop-card", now());
            }
            let last = now() - Duration::minutes(minutes_ago);
            CardMemory {
                id: "prop-card".to_string(),
                difficulty,
                stability,
                elapsed_days: 0.0,
                scheduled_days: stability,
                reps,
                lapses: lapses.min(reps),
                state,
                due: last,
                last_review: Some(last),
            }
        })
}

proptest! {
    #[test]
    fn review_output_stays_in_bounds(memory in any_memory(), rating in any_rating(), seed in any::<u64>()) {
        let scheduler = FSRSScheduler::default();
        let result = scheduler.review(&memory, rating, now(), &mut ChaCha8Rng::seed_from_u64(seed));
        let after = &result.memory;

        prop_assert!((1.0..=10.0).contains(&after.difficulty));
        prop_assert!(after.stability >= MIN_STABILITY && after.stability <= MAX_STABILITY);
        prop_assert_eq!(after.reps, memory.reps + 1);
        prop_assert_eq!(after.last_review, Some(now()));
        prop_assert!(after.due > now());
        prop_assert!(result.interval_days > 0.0);
        prop_assert!(result.interval_days <= scheduler.params().maximum_interval);
        prop_assert!(after.validate().is_ok());
    }

    #[test]
    fn state_follows_transition_table(memory in any_memory(), rating in any_rating()) {
        let result = FSRSScheduler::default().review(&memory, rating, now(), &mut ChaCha8Rng::seed_from_u64(0));
        prop_assert_eq!(result.memory.state, next_state(memory.state, rating));
    }

    #[test]
    fn lapses_only_count_forgotten_reviews(memory in any_memory(), rating in any_rating()) {
        let result = FSRSScheduler::default().review(&memory, rating, now(), &mut ChaCha8Rng::seed_from_u64(0));
        let lapsed = rating == Rating::Again
            && matches!(memory.state, LearningState::Review | LearningState::Relearning);
        let expected = if lapsed { memory.lapses + 1 } else { memory.lapses };
        prop_assert_eq!(result.memory.lapses, expected);
    }

    #[test]
    fn short_term_states_get_minute_steps(memory in any_memory(), rating in any_rating()) {
        let scheduler = FSRSScheduler::default();
        let result = scheduler.review(&memory, rating, now(), &mut ChaCha8Rng::seed_from_u64(0));
        if matches!(result.memory.state, LearningState::Learning | LearningState::Relearning) {
            let params = scheduler.params();
            let minutes = result.interval_days * 24.0 * 60.0;
            prop_assert!(minutes >= params.learning_step_min_minutes - 1e-6);
            prop_assert!(minutes <= params.learning_step_max_minutes + 1e-6);
        } else {
            prop_assert!(result.interval_days >= 1.0);
        }
    }

    #[test]
    fn successful_recall_never_shrinks_stability(memory in any_memory(), rating in any_rating()) {
        prop_assume!(memory.state != LearningState::New && rating != Rating::Again);
        let result = FSRSScheduler::default().review(&memory, rating, now(), &mut ChaCha8Rng::seed_from_u64(0));
        prop_assert!(result.memory.stability >= memory.stability - 1e-9);
    }

    #[test]
    fn easier_grades_never_raise_difficulty(memory in any_memory()) {
        let preview = FSRSScheduler::default().preview(&memory, now(), &ChaCha8Rng::seed_from_u64(0));
        let difficulties: Vec<f64> = Rating::ALL.iter().map(|r| preview.get(*r).memory.difficulty).collect();
        for pair in difficulties.windows(2) {
            prop_assert!(pair[1] <= pair[0] + 1e-9);
        }
    }

    #[test]
    fn preview_matches_review_with_same_seed(memory in any_memory(), rating in any_rating(), seed in any::<u64>()) {
        let scheduler = FSRSScheduler::default();
        let rng = ChaCha8Rng::seed_from_u64(seed);
        let first = scheduler.preview(&memory, now(), &rng);
        let second = scheduler.preview(&memory, now(), &rng);
        prop_assert_eq!(&first, &second);

        let mut live = rng.clone();
        let graded = scheduler.review(&memory, rating, now(), &mut live);
        prop_assert_eq!(first.get(rating), &graded);
    }

    #[test]
    fn maximum_interval_is_a_hard_cap(memory in any_memory(), rating in any_rating(), cap in 1.0f64..60.0, seed in any::<u64>()) {
        let params = FSRSParameters { maximum_interval: cap.round(), ..Default::default() };
        let scheduler = FSRSScheduler::new(params);
        let result = scheduler.review(&memory, rating, now(), &mut ChaCha8Rng::seed_from_u64(seed));
        prop_assert!(result.interval_days <= cap.round());
    }

    #[test]
    fn unfuzzed_schedule_ignores_rng(memory in any_memory(), rating in any_rating(), a in any::<u64>(), b in any::<u64>()) {
        let params = FSRSParameters { enable_fuzz: false, ..Default::default() };
        let scheduler = FSRSScheduler::new(params);
        let left = scheduler.review(&memory, rating, now(), &mut ChaCha8Rng::seed_from_u64(a));
        let right = scheduler.review(&memory, rating, now(), &mut ChaCha8Rng::seed_from_u64(b));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn input_memory_is_untouched(memory in any_memory(), rating in any_rating()) {
        let before = memory.clone();
        let _ = FSRSScheduler::default().review(&memory, rating, now(), &mut ChaCha8Rng::seed_from_u64(0));
        prop_assert_eq!(memory, before);
    }
}
