//! Durability journeys: everything a session writes survives reopening the file

use chrono::{DateTime, Duration, Utc};
use reprise_core::{ErrorKind, LearningState, Rating, ReviewRecord, StudyScope, StudyStore};
use reprise_e2e_tests::TestDatabaseManager;

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_718_000_000_000).unwrap()
}

#[test]
fn test_graded_memory_survives_reopen() {
    let db = TestDatabaseManager::new_temp();
    let cards = db.seed_new_cards("spanish", 2, now());
    let mut session = db.start_session(StudyScope::All, now());
    let outcome = session.grade(3, 1_500, now()).unwrap();
    drop(session);

    let reopened = db.reopen();
    let card = reopened.get_card(cards[0].id()).unwrap().unwrap();
    assert_eq!(card.memory, outcome.result.memory);
    assert_eq!(card.memory.reps, 1);

    let record = reopened.last_review_for_card(cards[0].id()).unwrap().unwrap();
    assert_eq!(record, outcome.record);
    assert_eq!(reopened.count_reviews(None).unwrap(), 1);
}

#[test]
fn test_undo_is_durable() {
    let db = TestDatabaseManager::new_temp();
    let cards = db.seed_new_cards("spanish", 2, now());
    let mut session = db.start_session(StudyScope::All, now());
    session.grade(4, 0, now()).unwrap();
    session.undo(now()).unwrap();

    let reopened = db.reopen();
    let card = reopened.get_card(cards[0].id()).unwrap().unwrap();
    assert_eq!(card.memory, cards[0].memory);
    assert_eq!(card.memory.state, LearningState::New);
    assert_eq!(reopened.count_reviews(Some(cards[0].id())).unwrap(), 0);
}

#[test]
fn test_undo_refuses_after_another_writer_reviewed_the_card() {
    let db = TestDatabaseManager::new_temp();
    let cards = db.seed_new_cards("spanish", 2, now());
    let mut session = db.start_session(StudyScope::All, now());
    let graded = session.grade(3, 0, now()).unwrap();

    let later = now() + Duration::minutes(2);
    let other = db.reopen();
    let foreign = ReviewRecord::new(&cards[0], Rating::Hard, 0, later);
    other.append_review(&foreign).unwrap();

    let err = session.undo(later).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let reopened = db.reopen();
    assert_eq!(reopened.count_reviews(Some(cards[0].id())).unwrap(), 2);
    let card = reopened.get_card(cards[0].id()).unwrap().unwrap();
    assert_eq!(card.memory, graded.result.memory);
    assert_eq!(session.queue().position(), 1);
}

#[test]
fn test_graded_card_leaves_due_set_after_reopen() {
    let db = TestDatabaseManager::new_temp();
    db.seed_new_cards("spanish", 3, now());
    let mut session = db.start_session(StudyScope::All, now());
    while session.current().is_some() {
        session.grade(3, 0, now()).unwrap();
    }

    let reopened = db.reopen();
    let scope = StudyScope::All;
    assert!(reopened.due_cards(&scope, now(), 100).unwrap().is_empty());

    let stats = reopened.card_stats(&scope, now()).unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.review, 3);
    assert_eq!(stats.due, 0);

    let far_future = now() + Duration::days(3650);
    assert_eq!(reopened.due_cards(&scope, far_future, 100).unwrap().len(), 3);
}

#[test]
fn test_progress_and_achievements_survive_reopen() {
    let db = TestDatabaseManager::new_temp();
    db.seed_new_cards("spanish", 2, now());
    let mut session = db.start_session(StudyScope::All, now());
    session.grade(3, 0, now()).unwrap();
    session.grade(1, 0, now()).unwrap();

    let tracker_store = db.reopen();
    let progress = tracker_store.load_progress().unwrap().unwrap();
    assert_eq!(progress.total_reviewed, 2);
    assert_eq!(progress.last_study_date, Some(now().date_naive()));
    assert!(tracker_store.unlock_achievement("first_review", now()).unwrap());

    let reopened = db.reopen();
    let unlocked = reopened.unlocked_achievements().unwrap();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].id, "first_review");
    assert_eq!(unlocked[0].unlocked_at, now());
    assert!(!reopened.unlock_achievement("first_review", now()).unwrap());
}

#[test]
fn test_session_resumes_from_stored_memory() {
    let db = TestDatabaseManager::new_temp();
    let cards = db.seed_new_cards("spanish", 1, now());
    let mut first = db.start_session(StudyScope::All, now());
    let graded = first.grade(1, 0, now()).unwrap();
    assert_eq!(graded.result.memory.state, LearningState::Learning);
    drop(first);

    let later = graded.result.memory.due;
    let mut second = db.start_session(StudyScope::All, later);
    assert_eq!(second.current().map(|c| c.id()), Some(cards[0].id()));
    assert_eq!(second.current().map(|c| c.memory.reps), Some(1));

    let again = second.grade(3, 0, later).unwrap();
    assert_eq!(again.result.memory.reps, 2);
    assert_eq!(again.result.memory.state, LearningState::Review);
    assert_eq!(db.review_count(), 2);
}
