//! Study session journeys against a real SQLite database

use chrono::{DateTime, Duration, Utc};
use reprise_core::{
    AchievementTracker, ErrorKind, EventBus, LearningState, ReviewError, ReviewEvent,
    SessionStatus, StudyScope, StudyStore,
};
use reprise_e2e_tests::{TestDataFactory, TestDatabaseManager};

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_718_000_000_000).unwrap()
}

#[test]
fn test_new_card_good_journey() {
    let db = TestDatabaseManager::new_temp();
    let cards = db.seed_new_cards("spanish", 1, now());
    let mut session = db.start_session(StudyScope::All, now());

    let outcome = session.grade(3, 4_000, now()).unwrap();
    assert_eq!(outcome.result.memory.state, LearningState::Review);
    assert!(outcome.result.memory.stability > 0.0);
    assert!(outcome.result.memory.due > now());

    let stored = db.memory(cards[0].id());
    assert_eq!(stored, outcome.result.memory);
    assert_eq!(db.review_count(), 1);
    assert!(session.is_complete());
}

#[test]
fn test_lapse_journey() {
    let db = TestDatabaseManager::new_temp();
    let memory = TestDataFactory::review_memory("mature", 15.0, 5.0, now());
    db.seed_card_with_memory("spanish", memory.clone(), now() - Duration::days(60));
    let mut session = db.start_session(StudyScope::All, now());

    let outcome = session.grade(1, 9_000, now()).unwrap();
    let after = &outcome.result.memory;
    assert_eq!(after.state, LearningState::Relearning);
    assert_eq!(after.lapses, memory.lapses + 1);
    assert!(after.due - now() < Duration::days(1));
    assert!(after.stability < memory.stability);
}

#[test]
fn test_grade_then_undo_journey() {
    let db = TestDatabaseManager::new_temp();
    let cards = db.seed_new_cards("spanish", 3, now());
    let mut session = db.start_session(StudyScope::All, now());
    let before = db.memory(cards[0].id());

    let graded = session.grade(2, 1_000, now()).unwrap();
    assert_ne!(db.memory(cards[0].id()), before);

    let undone = session.undo(now()).unwrap();
    assert_eq!(undone.record_id, graded.record.id);
    assert_eq!(db.memory(cards[0].id()), before);
    assert_eq!(db.review_count(), 0);
    assert!(db.store.last_review_for_card(cards[0].id()).unwrap().is_none());
    assert_eq!(session.current().map(|c| c.id()), Some(cards[0].id()));
}

#[test]
fn test_only_due_card_is_studied() {
    let db = TestDatabaseManager::new_temp();
    let due = db.seed_new_cards("spanish", 1, now());
    let mut later = TestDataFactory::review_memory("later", 30.0, 4.0, now());
    later.due = now() + Duration::days(3);
    db.seed_card_with_memory("spanish", later, now() - Duration::days(40));

    let mut session = db.start_session(StudyScope::All, now());
    assert_eq!(session.queue().len(), 1);
    assert_eq!(session.current().map(|c| c.id()), Some(due[0].id()));

    session.grade(4, 500, now()).unwrap();
    assert!(session.queue().is_complete());
    assert_eq!(session.status(), SessionStatus::Complete);
}

#[test]
fn test_out_of_range_grade_journey() {
    let db = TestDatabaseManager::new_temp();
    let cards = db.seed_new_cards("spanish", 2, now());
    let mut session = db.start_session(StudyScope::All, now());

    let err = session.grade(5, 0, now()).unwrap_err();
    assert!(matches!(err, ReviewError::InvalidGrade(5)));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(session.queue().position(), 0);
    assert_eq!(db.memory(cards[0].id()), cards[0].memory);
    assert_eq!(db.review_count(), 0);
}

#[test]
fn test_queue_order_new_learning_review() {
    let db = TestDatabaseManager::new_temp();
    let review = TestDataFactory::review_memory("r", 10.0, 5.0, now());
    let learning = TestDataFactory::learning_memory("l", now());
    let mut new = TestDataFactory::new_cards("spanish", 1, now()).remove(0);
    new.memory.due = now();

    db.seed_card_with_memory("spanish", review, now() - Duration::days(20));
    db.seed_card_with_memory("spanish", learning, now() - Duration::days(1));
    db.store.insert_card(&new).unwrap();

    let session = db.start_session(StudyScope::All, now());
    let states: Vec<_> = session
        .queue()
        .cards()
        .iter()
        .map(|c| c.memory.state)
        .collect();
    assert_eq!(
        states,
        vec![LearningState::New, LearningState::Learning, LearningState::Review]
    );
}

#[test]
fn test_deck_scope_and_session_cap() {
    let mut db = TestDatabaseManager::new_temp();
    db.seed_new_cards("spanish", 5, now());
    db.seed_new_cards("french", 3, now());
    db.config.session.max_cards = 4;

    let french = db.start_session(StudyScope::Deck("french".into()), now());
    assert_eq!(french.queue().len(), 3);
    assert!(french.queue().cards().iter().all(|c| c.deck_id == "french"));

    let all = db.start_session(StudyScope::All, now());
    assert_eq!(all.queue().len(), 4);
}

#[test]
fn test_full_session_with_progress_and_achievements() {
    let db = TestDatabaseManager::new_temp();
    db.seed_new_cards("spanish", 4, now());
    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let mut session = db.start_session_with_bus(StudyScope::All, now(), bus);
    let tracker = AchievementTracker::new(db.store.as_ref());

    let mut unlocked = Vec::new();
    let mut summaries = Vec::new();
    for grade in [3, 1, 4, 3] {
        let outcome = session.grade(grade, 2_000, now()).unwrap();
        unlocked.extend(tracker.drain(&mut rx).unwrap());
        summaries.push(outcome.summary.is_some());
    }
    assert_eq!(summaries, vec![false, false, false, true]);

    let summary = session.summary();
    assert_eq!(summary.stats.reviewed, 4);
    assert_eq!(summary.stats.again, 1);
    assert!((summary.accuracy - 0.75).abs() < 1e-12);
    assert_eq!(unlocked.iter().map(|a| a.id).collect::<Vec<_>>(), vec!["first_review"]);

    let progress = db.store.load_progress().unwrap().unwrap();
    assert_eq!(progress.total_reviewed, 4);
    assert_eq!(progress.current_streak, 1);
    assert_eq!(progress.reviewed_today, 4);
}

#[test]
fn test_undo_does_not_roll_back_progress() {
    let db = TestDatabaseManager::new_temp();
    db.seed_new_cards("spanish", 2, now());
    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let mut session = db.start_session_with_bus(StudyScope::All, now(), bus);

    session.grade(3, 0, now()).unwrap();
    session.undo(now()).unwrap();
    session.grade(3, 0, now()).unwrap();

    let progress = db.store.load_progress().unwrap().unwrap();
    assert_eq!(progress.total_reviewed, 2);
    assert_eq!(db.review_count(), 1);

    let kinds: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|e| match e {
            ReviewEvent::CardGraded { .. } => "graded",
            ReviewEvent::GradeUndone { .. } => "undone",
            ReviewEvent::SessionCompleted { .. } => "completed",
        })
        .collect();
    assert_eq!(kinds, vec!["graded", "undone", "graded"]);
}

#[test]
fn test_multi_day_streak() {
    let db = TestDatabaseManager::new_temp();
    for day in 0..3 {
        let today = now() + Duration::days(day);
        db.seed_new_cards(&format!("deck-{}", day), 1, today);
        let mut session = db.start_session(StudyScope::Deck(format!("deck-{}", day)), today);
        session.grade(3, 0, today).unwrap();
    }
    let progress = db.store.load_progress().unwrap().unwrap();
    assert_eq!(progress.current_streak, 3);
    assert_eq!(progress.longest_streak, 3);

    let unlocked = AchievementTracker::new(db.store.as_ref())
        .evaluate(progress.total_reviewed, progress.current_streak, now())
        .unwrap();
    assert!(unlocked.iter().any(|a| a.id == "streak_3"));
}
