//! Per-team match history
//!
//! The full mapping is loaded once at startup; appends accumulate in
//! memory and are flushed in a single transaction at the end of the
//! batch. A crash mid-batch loses only that batch's appends.

use crate::error::{BotError, Result};
use crate::types::MatchObservation;
use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use std::collections::{HashMap, HashSet};

/// Append-only per-team observation sequences plus the
/// processed-fixture watermark that guards against double ingestion.
pub struct HistoryStore {
    pool: SqlitePool,
    teams: HashMap<String, Vec<MatchObservation>>,
    processed: HashSet<String>,
    staged_rows: Vec<StagedRow>,
    staged_fixtures: Vec<String>,
}

struct StagedRow {
    team_id: String,
    seq: i64,
    observation: MatchObservation,
}

impl HistoryStore {
    /// Load the full history mapping and watermark set
    pub async fn load(pool: SqlitePool) -> Result<Self> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT team_id, seq, goals_for, goals_against, shots, corners, possession_pct
            FROM team_history
            ORDER BY team_id, seq ASC
            "#,
        )
        .fetch_all(&pool)
        .await?;

        let mut teams: HashMap<String, Vec<MatchObservation>> = HashMap::new();
        for row in rows {
            let observation = row.validate()?;
            let entries = teams.entry(row.team_id).or_default();
            if row.seq != entries.len() as i64 {
                return Err(BotError::CorruptState(format!(
                    "team_history sequence gap: expected seq {} got {}",
                    entries.len(),
                    row.seq
                )));
            }
            entries.push(observation);
        }

        let processed = sqlx::query_scalar::<_, String>("SELECT fixture_id FROM processed_fixtures")
            .fetch_all(&pool)
            .await?
            .into_iter()
            .collect();

        Ok(Self {
            pool,
            teams,
            processed,
            staged_rows: Vec::new(),
            staged_fixtures: Vec::new(),
        })
    }

    /// Append one observation to a team's sequence
    pub fn append(&mut self, team_id: &str, observation: MatchObservation) {
        let entries = self.teams.entry(team_id.to_string()).or_default();
        entries.push(observation);
        self.staged_rows.push(StagedRow {
            team_id: team_id.to_string(),
            seq: entries.len() as i64 - 1,
            observation,
        });
    }

    /// Last `n` observations in chronological order
    pub fn recent(&self, team_id: &str, n: usize) -> Result<&[MatchObservation]> {
        let entries = self.teams.get(team_id).map(Vec::as_slice).unwrap_or(&[]);
        if entries.len() < n {
            return Err(BotError::InsufficientHistory {
                team_id: team_id.to_string(),
                have: entries.len(),
                need: n,
            });
        }
        Ok(&entries[entries.len() - n..])
    }

    pub fn observation_count(&self, team_id: &str) -> usize {
        self.teams.get(team_id).map(Vec::len).unwrap_or(0)
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    /// Whether a finished fixture was already folded into history
    pub fn is_processed(&self, fixture_id: &str) -> bool {
        self.processed.contains(fixture_id)
    }

    /// Mark a fixture ingested; persisted together with its observations
    pub fn mark_processed(&mut self, fixture_id: &str) {
        if self.processed.insert(fixture_id.to_string()) {
            self.staged_fixtures.push(fixture_id.to_string());
        }
    }

    /// Flush staged appends and watermarks in one transaction
    pub async fn persist(&mut self) -> Result<()> {
        if self.staged_rows.is_empty() && self.staged_fixtures.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for row in &self.staged_rows {
            sqlx::query(
                r#"
                INSERT INTO team_history
                (team_id, seq, goals_for, goals_against, shots, corners, possession_pct)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&row.team_id)
            .bind(row.seq)
            .bind(row.observation.goals_for)
            .bind(row.observation.goals_against)
            .bind(row.observation.shots)
            .bind(row.observation.corners)
            .bind(row.observation.possession_pct)
            .execute(&mut *tx)
            .await?;
        }

        let now = Utc::now().to_rfc3339();
        for fixture_id in &self.staged_fixtures {
            sqlx::query(
                "INSERT OR IGNORE INTO processed_fixtures (fixture_id, processed_at) VALUES (?, ?)",
            )
            .bind(fixture_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            rows = self.staged_rows.len(),
            fixtures = self.staged_fixtures.len(),
            "history flushed"
        );
        self.staged_rows.clear();
        self.staged_fixtures.clear();
        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    team_id: String,
    seq: i64,
    goals_for: f64,
    goals_against: f64,
    shots: f64,
    corners: f64,
    possession_pct: f64,
}

impl HistoryRow {
    fn validate(&self) -> Result<MatchObservation> {
        let values = [
            self.goals_for,
            self.goals_against,
            self.shots,
            self.corners,
            self.possession_pct,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(BotError::CorruptState(format!(
                "non-finite statistic for team {} seq {}",
                self.team_id, self.seq
            )));
        }
        Ok(MatchObservation::from_array(values))
    }
}
