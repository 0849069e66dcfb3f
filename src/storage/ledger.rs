//! Dedup ledger of raised signals
//!
//! Append-only table; the in-memory index keyed by fixture_key is
//! rebuilt from it at startup for O(1) duplicate checks. A fixture gets
//! at most one entry for its entire lifetime.

use crate::error::{BotError, Result};
use crate::types::{LedgerEntry, Signal, SignalStatus};
use sqlx::sqlite::SqlitePool;
use std::collections::HashMap;

pub struct SignalLedger {
    pool: SqlitePool,
    entries: HashMap<String, LedgerEntry>,
}

impl SignalLedger {
    /// Rebuild the index from the persisted table
    pub async fn load(pool: SqlitePool) -> Result<Self> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT fixture_key, predicted_outcome, probability, odd, value_score, timestamp, status
            FROM ledger
            "#,
        )
        .fetch_all(&pool)
        .await?;

        let mut entries = HashMap::with_capacity(rows.len());
        for row in rows {
            let entry: LedgerEntry = row.try_into()?;
            entries.insert(entry.signal.fixture_key.clone(), entry);
        }

        Ok(Self { pool, entries })
    }

    pub fn has_entry(&self, fixture_key: &str) -> bool {
        self.entries.contains_key(fixture_key)
    }

    pub fn get(&self, fixture_key: &str) -> Option<&LedgerEntry> {
        self.entries.get(fixture_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.values()
    }

    /// Fixture keys of entries still awaiting settlement
    pub fn pending_keys(&self) -> Vec<String> {
        self.entries
            .values()
            .filter(|e| e.status == SignalStatus::Pending)
            .map(|e| e.signal.fixture_key.clone())
            .collect()
    }

    /// Record a new Pending entry; rejects a fixture already recorded
    pub async fn record(&mut self, signal: Signal) -> Result<&LedgerEntry> {
        if self.entries.contains_key(&signal.fixture_key) {
            return Err(BotError::DuplicateSignal(signal.fixture_key));
        }

        sqlx::query(
            r#"
            INSERT INTO ledger
            (fixture_key, predicted_outcome, probability, odd, value_score, timestamp, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&signal.fixture_key)
        .bind(signal.predicted_outcome.as_str())
        .bind(signal.probability.to_string())
        .bind(signal.odd.to_string())
        .bind(signal.value_score.to_string())
        .bind(signal.timestamp.to_rfc3339())
        .bind(SignalStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        let fixture_key = signal.fixture_key.clone();
        let entry = LedgerEntry {
            signal,
            status: SignalStatus::Pending,
        };
        Ok(self.entries.entry(fixture_key).or_insert(entry))
    }

    /// Move a Pending entry to its terminal status.
    ///
    /// Returns false without touching anything if the entry is missing
    /// or already settled, so re-running settlement is a no-op.
    pub async fn mark_settled(&mut self, fixture_key: &str, status: SignalStatus) -> Result<bool> {
        if status == SignalStatus::Pending {
            return Err(BotError::Config(
                "settlement status must be Win or Loss".to_string(),
            ));
        }

        let Some(entry) = self.entries.get_mut(fixture_key) else {
            return Ok(false);
        };
        if entry.status != SignalStatus::Pending {
            return Ok(false);
        }

        sqlx::query("UPDATE ledger SET status = ? WHERE fixture_key = ? AND status = ?")
            .bind(status.as_str())
            .bind(fixture_key)
            .bind(SignalStatus::Pending.as_str())
            .execute(&self.pool)
            .await?;

        entry.status = status;
        Ok(true)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    fixture_key: String,
    predicted_outcome: String,
    probability: String,
    odd: String,
    value_score: String,
    timestamp: String,
    status: String,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = BotError;

    fn try_from(row: LedgerRow) -> Result<Self> {
        let corrupt = |what: &str| {
            BotError::CorruptState(format!(
                "ledger entry {}: bad {what}",
                row.fixture_key
            ))
        };

        Ok(LedgerEntry {
            signal: Signal {
                predicted_outcome: row
                    .predicted_outcome
                    .parse()
                    .map_err(|_| corrupt("predicted_outcome"))?,
                probability: row.probability.parse().map_err(|_| corrupt("probability"))?,
                odd: row.odd.parse().map_err(|_| corrupt("odd"))?,
                value_score: row.value_score.parse().map_err(|_| corrupt("value_score"))?,
                timestamp: row
                    .timestamp
                    .parse()
                    .map_err(|_| corrupt("timestamp"))?,
                fixture_key: row.fixture_key.clone(),
            },
            status: row.status.parse().map_err(|_| corrupt("status"))?,
        })
    }
}
