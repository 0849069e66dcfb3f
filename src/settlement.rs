//! Settlement of recorded signals against real outcomes

use crate::error::Result;
use crate::storage::SignalLedger;
use crate::types::{LedgerEntry, Outcome, SignalStatus};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettlementSummary {
    pub wins: usize,
    pub losses: usize,
}

impl SettlementSummary {
    pub fn settled(&self) -> usize {
        self.wins + self.losses
    }
}

/// Mark every Pending entry whose fixture appears in `results` as Win
/// or Loss. Entries already settled are left untouched, so re-running
/// against the same result set is a no-op.
pub async fn settle(
    ledger: &mut SignalLedger,
    results: &HashMap<String, Outcome>,
) -> Result<SettlementSummary> {
    let mut summary = SettlementSummary::default();

    for fixture_key in ledger.pending_keys() {
        let Some(&actual) = results.get(&fixture_key) else {
            continue;
        };
        let Some(entry) = ledger.get(&fixture_key) else {
            continue;
        };
        let predicted = entry.signal.predicted_outcome;

        let status = if predicted == actual {
            SignalStatus::Win
        } else {
            SignalStatus::Loss
        };

        if ledger.mark_settled(&fixture_key, status).await? {
            match status {
                SignalStatus::Win => summary.wins += 1,
                SignalStatus::Loss => summary.losses += 1,
                SignalStatus::Pending => unreachable!(),
            }
            tracing::info!(fixture = %fixture_key, result = %actual, status = status.as_str(), "signal settled");
        }
    }

    Ok(summary)
}

/// Aggregate performance over settled ledger entries. Derived on
/// demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceStats {
    pub settled: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: Decimal,
    pub profit: Decimal,
    pub roi: Decimal,
    pub stake: Decimal,
}

impl PerformanceStats {
    pub fn from_entries<'a, I>(entries: I, stake: Decimal) -> Self
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        let mut settled = 0usize;
        let mut wins = 0usize;
        let mut profit = Decimal::ZERO;

        for entry in entries {
            match entry.status {
                SignalStatus::Pending => continue,
                SignalStatus::Win => {
                    settled += 1;
                    wins += 1;
                    profit += (entry.signal.odd - Decimal::ONE) * stake;
                }
                SignalStatus::Loss => {
                    settled += 1;
                    profit -= stake;
                }
            }
        }

        let losses = settled - wins;
        let (win_rate, roi) = if settled == 0 {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let staked = stake * Decimal::from(settled as u64);
            (
                Decimal::from(wins as u64) / Decimal::from(settled as u64),
                profit / staked,
            )
        };

        Self {
            settled,
            wins,
            losses,
            win_rate,
            profit,
            roi,
            stake,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, SignalLedger};
    use crate::types::Signal;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn signal(fixture_key: &str, outcome: Outcome, odd: Decimal) -> Signal {
        Signal {
            fixture_key: fixture_key.to_string(),
            predicted_outcome: outcome,
            probability: dec!(0.40),
            odd,
            value_score: dec!(1.20),
            timestamp: Utc::now(),
        }
    }

    async fn ledger_with_pending() -> SignalLedger {
        let db = Database::connect_memory().await.unwrap();
        let mut ledger = SignalLedger::load(db.pool().clone()).await.unwrap();
        ledger
            .record(signal("fx-1", Outcome::Home, dec!(3.0)))
            .await
            .unwrap();
        ledger
            .record(signal("fx-2", Outcome::Away, dec!(2.5)))
            .await
            .unwrap();
        ledger
            .record(signal("fx-3", Outcome::Draw, dec!(3.4)))
            .await
            .unwrap();
        ledger
    }

    fn results() -> HashMap<String, Outcome> {
        [
            ("fx-1".to_string(), Outcome::Home),
            ("fx-2".to_string(), Outcome::Home),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_settle_marks_win_and_loss() {
        let mut ledger = ledger_with_pending().await;

        let summary = settle(&mut ledger, &results()).await.unwrap();
        assert_eq!(summary, SettlementSummary { wins: 1, losses: 1 });

        assert_eq!(ledger.get("fx-1").unwrap().status, SignalStatus::Win);
        assert_eq!(ledger.get("fx-2").unwrap().status, SignalStatus::Loss);
        // fx-3 had no known result yet
        assert_eq!(ledger.get("fx-3").unwrap().status, SignalStatus::Pending);
    }

    #[tokio::test]
    async fn test_settle_is_idempotent() {
        let mut ledger = ledger_with_pending().await;

        settle(&mut ledger, &results()).await.unwrap();
        let before: Vec<LedgerEntry> = {
            let mut entries: Vec<_> = ledger.entries().cloned().collect();
            entries.sort_by(|a, b| a.signal.fixture_key.cmp(&b.signal.fixture_key));
            entries
        };

        let second = settle(&mut ledger, &results()).await.unwrap();
        assert_eq!(second.settled(), 0, "second run must settle nothing");

        let mut after: Vec<_> = ledger.entries().cloned().collect();
        after.sort_by(|a, b| a.signal.fixture_key.cmp(&b.signal.fixture_key));
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_stats_profit_and_win_rate() {
        let mut ledger = ledger_with_pending().await;
        settle(&mut ledger, &results()).await.unwrap();

        let stats = PerformanceStats::from_entries(ledger.entries(), dec!(10));

        assert_eq!(stats.settled, 2);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.win_rate, dec!(0.5));
        // Win at 3.0 pays (3.0 - 1) * 10 = 20; loss costs 10
        assert_eq!(stats.profit, dec!(10));
        assert_eq!(stats.roi, dec!(0.5));
    }

    #[test]
    fn test_stats_empty_ledger() {
        let stats = PerformanceStats::from_entries(std::iter::empty(), dec!(10));
        assert_eq!(stats.settled, 0);
        assert_eq!(stats.win_rate, Decimal::ZERO);
        assert_eq!(stats.profit, Decimal::ZERO);
        assert_eq!(stats.roi, Decimal::ZERO);
    }
}
