//! Tests for storage module

use super::{Database, HistoryStore, SignalLedger};
use crate::error::BotError;
use crate::types::{MatchObservation, Outcome, Signal, SignalStatus};
use chrono::Utc;
use rust_decimal_macros::dec;

fn obs(goals_for: f64, goals_against: f64) -> MatchObservation {
    MatchObservation {
        goals_for,
        goals_against,
        shots: 4.0,
        corners: 3.0,
        possession_pct: 50.0,
    }
}

fn make_signal(fixture_key: &str) -> Signal {
    Signal {
        fixture_key: fixture_key.to_string(),
        predicted_outcome: Outcome::Home,
        probability: dec!(0.40),
        odd: dec!(3.0),
        value_score: dec!(1.20),
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn test_recent_requires_full_window() {
    let db = Database::connect_memory().await.unwrap();
    let mut history = HistoryStore::load(db.pool().clone()).await.unwrap();

    for i in 0..4 {
        history.append("33", obs(i as f64, 0.0));
        let err = history.recent("33", 5).unwrap_err();
        assert!(matches!(
            err,
            BotError::InsufficientHistory { have, need: 5, .. } if have == i + 1
        ));
    }

    history.append("33", obs(4.0, 0.0));
    let window = history.recent("33", 5).unwrap();
    assert_eq!(window.len(), 5);
    // Oldest-first within the window
    assert_eq!(window[0].goals_for, 0.0);
    assert_eq!(window[4].goals_for, 4.0);

    // A sixth append shifts the window forward
    history.append("33", obs(5.0, 0.0));
    let window = history.recent("33", 5).unwrap();
    assert_eq!(window[0].goals_for, 1.0);
    assert_eq!(window[4].goals_for, 5.0);
}

#[tokio::test]
async fn test_unknown_team_has_no_history() {
    let db = Database::connect_memory().await.unwrap();
    let history = HistoryStore::load(db.pool().clone()).await.unwrap();

    let err = history.recent("9999", 5).unwrap_err();
    assert!(matches!(
        err,
        BotError::InsufficientHistory { have: 0, need: 5, .. }
    ));
}

#[tokio::test]
async fn test_history_round_trip_preserves_order() {
    let db = Database::connect_memory().await.unwrap();
    let mut history = HistoryStore::load(db.pool().clone()).await.unwrap();

    for i in 0..7 {
        history.append("40", obs(i as f64, (6 - i) as f64));
    }
    history.append("41", obs(9.0, 9.0));
    history.mark_processed("fixture-1001");
    history.persist().await.unwrap();

    let reloaded = HistoryStore::load(db.pool().clone()).await.unwrap();
    assert_eq!(reloaded.team_count(), 2);
    assert_eq!(reloaded.observation_count("40"), 7);
    assert_eq!(reloaded.observation_count("41"), 1);
    assert!(reloaded.is_processed("fixture-1001"));
    assert!(!reloaded.is_processed("fixture-1002"));

    let window = reloaded.recent("40", 5).unwrap();
    let original = history.recent("40", 5).unwrap();
    assert_eq!(window, original);
    assert_eq!(window[0].goals_for, 2.0);
    assert_eq!(window[4].goals_for, 6.0);
}

#[tokio::test]
async fn test_persist_is_incremental() {
    let db = Database::connect_memory().await.unwrap();
    let mut history = HistoryStore::load(db.pool().clone()).await.unwrap();

    history.append("50", obs(1.0, 0.0));
    history.persist().await.unwrap();

    // Second batch appends more and flushes again; earlier rows stay put
    history.append("50", obs(2.0, 0.0));
    history.persist().await.unwrap();

    let reloaded = HistoryStore::load(db.pool().clone()).await.unwrap();
    assert_eq!(reloaded.observation_count("50"), 2);
}

#[tokio::test]
async fn test_ledger_rejects_duplicate_fixture() {
    let db = Database::connect_memory().await.unwrap();
    let mut ledger = SignalLedger::load(db.pool().clone()).await.unwrap();

    ledger.record(make_signal("fx-1")).await.unwrap();
    assert_eq!(ledger.len(), 1);

    let err = ledger.record(make_signal("fx-1")).await.unwrap_err();
    assert!(matches!(err, BotError::DuplicateSignal(key) if key == "fx-1"));
    assert_eq!(ledger.len(), 1, "duplicate must not grow the ledger");
}

#[tokio::test]
async fn test_dedup_survives_reload() {
    let db = Database::connect_memory().await.unwrap();
    let mut ledger = SignalLedger::load(db.pool().clone()).await.unwrap();
    ledger.record(make_signal("fx-2")).await.unwrap();

    // A later detector run rebuilds the index from the table
    let mut reloaded = SignalLedger::load(db.pool().clone()).await.unwrap();
    assert!(reloaded.has_entry("fx-2"));
    let err = reloaded.record(make_signal("fx-2")).await.unwrap_err();
    assert!(matches!(err, BotError::DuplicateSignal(_)));
}

#[tokio::test]
async fn test_ledger_round_trip() {
    let db = Database::connect_memory().await.unwrap();
    let mut ledger = SignalLedger::load(db.pool().clone()).await.unwrap();

    let signal = make_signal("fx-3");
    ledger.record(signal.clone()).await.unwrap();
    ledger
        .mark_settled("fx-3", SignalStatus::Win)
        .await
        .unwrap();

    let reloaded = SignalLedger::load(db.pool().clone()).await.unwrap();
    let entry = reloaded.get("fx-3").unwrap();
    assert_eq!(entry.signal.probability, signal.probability);
    assert_eq!(entry.signal.odd, signal.odd);
    assert_eq!(entry.signal.value_score, signal.value_score);
    assert_eq!(entry.status, SignalStatus::Win);
}

#[tokio::test]
async fn test_settled_entries_are_terminal() {
    let db = Database::connect_memory().await.unwrap();
    let mut ledger = SignalLedger::load(db.pool().clone()).await.unwrap();

    ledger.record(make_signal("fx-4")).await.unwrap();
    assert!(ledger
        .mark_settled("fx-4", SignalStatus::Loss)
        .await
        .unwrap());

    // Second transition attempt is a no-op, not a flip
    assert!(!ledger
        .mark_settled("fx-4", SignalStatus::Win)
        .await
        .unwrap());
    assert_eq!(ledger.get("fx-4").unwrap().status, SignalStatus::Loss);

    // Unknown fixtures are ignored
    assert!(!ledger
        .mark_settled("fx-missing", SignalStatus::Win)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_pending_keys() {
    let db = Database::connect_memory().await.unwrap();
    let mut ledger = SignalLedger::load(db.pool().clone()).await.unwrap();

    ledger.record(make_signal("fx-a")).await.unwrap();
    ledger.record(make_signal("fx-b")).await.unwrap();
    ledger
        .mark_settled("fx-a", SignalStatus::Win)
        .await
        .unwrap();

    assert_eq!(ledger.pending_keys(), vec!["fx-b".to_string()]);
}
