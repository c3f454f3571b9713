//! Property tests for grade/undo: any interleaving leaves the store exactly
//! where a model of the undo history says it should be

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use reprise_core::{
    CardMemory, EventBus, InMemoryStore, ReviewController, ReviewError, StudyConfig, StudyScope,
    StudyStore,
};
use reprise_e2e_tests::{TestDataFactory, TestDatabaseManager};

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_718_000_000_000).unwrap()
}

#[derive(Debug, Clone)]
enum Op {
    Grade(i32),
    Undo,
}

fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1i32..=4).prop_map(Op::Grade),
        2 => Just(Op::Undo),
    ]
}

fn memory_of(store: &dyn StudyStore, card_id: &str) -> CardMemory {
    store.get_card(card_id).unwrap().unwrap().memory
}

/// Replay `ops`, checking the store after every step against the model
fn replay(store: Arc<dyn StudyStore>, config: &StudyConfig, ops: &[Op]) -> Result<(), TestCaseError> {
    let mut session =
        ReviewController::start(store.clone(), StudyScope::All, now(), config, EventBus::default())
            .unwrap();
    let initial = session.queue().len();
    let mut history: Vec<(String, CardMemory)> = Vec::new();
    let mut clock = now();

    for op in ops {
        clock += Duration::seconds(30);
        match op {
            Op::Grade(grade) => match session.current().map(|c| c.id().to_string()) {
                Some(card_id) => {
                    let before = memory_of(store.as_ref(), &card_id);
                    let outcome = session.grade(*grade, 1_000, clock).unwrap();
                    prop_assert_eq!(&memory_of(store.as_ref(), &card_id), &outcome.result.memory);
                    history.push((card_id, before));
                }
                None => {
                    let err = session.grade(*grade, 1_000, clock).unwrap_err();
                    prop_assert!(matches!(err, ReviewError::SessionComplete));
                }
            },
            Op::Undo => match history.pop() {
                Some((card_id, before)) => {
                    let undone = session.undo(now()).unwrap();
                    prop_assert_eq!(&undone.restored, &before);
                    prop_assert_eq!(&memory_of(store.as_ref(), &card_id), &before);
                    prop_assert_eq!(store.count_reviews(Some(card_id.as_str())).unwrap(), 0);
                    prop_assert_eq!(session.current().map(|c| c.id()), Some(card_id.as_str()));
                }
                None => {
                    let err = session.undo(now()).unwrap_err();
                    prop_assert!(matches!(err, ReviewError::NothingToUndo));
                }
            },
        }

        prop_assert_eq!(session.queue().position(), history.len());
        prop_assert_eq!(store.count_reviews(None).unwrap(), history.len() as i64);
        prop_assert_eq!(session.stats().reviewed as usize, history.len());
        prop_assert_eq!(session.is_complete(), history.len() == initial);
    }
    Ok(())
}

proptest! {
    #[test]
    fn interleaved_grades_and_undos_match_model(
        card_count in 1usize..6,
        ops in prop::collection::vec(any_op(), 0..24),
        seed in any::<u64>(),
    ) {
        let store = InMemoryStore::new();
        for card in TestDataFactory::new_cards("prop", card_count, now()) {
            store.insert_card(&card).unwrap();
        }
        let mut config = StudyConfig::default();
        config.session.fuzz_seed = Some(seed);
        replay(Arc::new(store), &config, &ops)?;
    }

    #[test]
    fn undo_everything_restores_every_card(
        grades in prop::collection::vec(1i32..=4, 1..6),
    ) {
        let store = Arc::new(InMemoryStore::new());
        let cards = TestDataFactory::new_cards("prop", grades.len(), now());
        for card in &cards {
            store.insert_card(card).unwrap();
        }
        let mut session = ReviewController::start(
            store.clone(),
            StudyScope::All,
            now(),
            &StudyConfig::default(),
            EventBus::default(),
        )
        .unwrap();

        for grade in &grades {
            session.grade(*grade, 0, now()).unwrap();
        }
        prop_assert!(session.is_complete());
        for _ in &grades {
            session.undo(now()).unwrap();
        }

        prop_assert!(!session.can_undo());
        prop_assert_eq!(session.queue().position(), 0);
        prop_assert_eq!(store.count_reviews(None).unwrap(), 0);
        for card in &cards {
            prop_assert_eq!(&memory_of(store.as_ref(), card.id()), &card.memory);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn sqlite_store_honors_the_same_model(
        card_count in 1usize..4,
        ops in prop::collection::vec(any_op(), 0..12),
    ) {
        let db = TestDatabaseManager::new_temp();
        db.seed_new_cards("prop", card_count, now());
        replay(db.dyn_store(), &db.config, &ops)?;
    }
}
