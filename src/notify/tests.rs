//! Tests for notification formatting

use super::*;
use crate::settlement::{PerformanceStats, SettlementSummary};
use crate::types::{Outcome, Signal};
use chrono::Utc;
use rust_decimal_macros::dec;

fn alert(label: &str, outcome: Outcome) -> ValueAlert {
    ValueAlert {
        fixture_label: label.to_string(),
        signal: Signal {
            fixture_key: "fx-1".to_string(),
            predicted_outcome: outcome,
            probability: dec!(0.40),
            odd: dec!(3.0),
            value_score: dec!(1.20),
            timestamp: Utc::now(),
        },
    }
}

#[test]
fn test_value_alert_format() {
    let text = format_value_alerts(&[alert("Arsenal vs Chelsea", Outcome::Home)], 5);

    assert!(text.starts_with("🚀 *NEW VALUE BETS*"));
    assert!(text.contains("*Arsenal vs Chelsea*"));
    assert!(text.contains("Bet: Home | Odd: 3.0 | Score: 1.20"));
    assert!(!text.contains("more)"));
}

#[test]
fn test_value_alert_cap() {
    let alerts: Vec<ValueAlert> = (0..8)
        .map(|i| alert(&format!("Fixture {i}"), Outcome::Away))
        .collect();

    let text = format_value_alerts(&alerts, 5);
    assert!(text.contains("Fixture 4"));
    assert!(!text.contains("Fixture 5"));
    assert!(text.contains("(+3 more)"));
}

#[test]
fn test_settlement_report_format() {
    let summary = SettlementSummary { wins: 2, losses: 1 };
    let entries: Vec<crate::types::LedgerEntry> = Vec::new();
    let mut stats = PerformanceStats::from_entries(&entries, dec!(10));
    stats.settled = 3;
    stats.wins = 2;
    stats.losses = 1;
    stats.win_rate = dec!(0.667);
    stats.profit = dec!(25.50);
    stats.roi = dec!(0.85);

    let text = format_settlement_report(&summary, &stats);
    assert!(text.contains("Newly settled: 3 (2 W / 1 L)"));
    assert!(text.contains("All-time: 3 bets"));
    assert!(text.contains("66.7%"));
    assert!(text.contains("+25.50"));
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("0123456789abc", 10), "0123456789...");
}

#[test]
fn test_disabled_notifier_sends_nothing() {
    // A disabled notifier must be constructible without config and
    // short-circuit before any network use.
    let notifier = Notifier::disabled();
    assert!(!notifier.enabled);
}
