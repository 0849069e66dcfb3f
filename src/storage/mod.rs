//! Data storage and persistence

pub mod history;
pub mod ledger;

#[cfg(test)]
mod tests;

pub use history::HistoryStore;
pub use ledger::SignalLedger;

use crate::error::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// SQLite database handle; owns the pool and schema
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to SQLite database (creates if not exists)
    pub async fn connect<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_url(&db_url).await
    }

    /// In-memory database, used by tests.
    /// Single connection: every new in-memory connection would otherwise
    /// see its own empty database.
    pub async fn connect_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    async fn connect_url(db_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS team_history (
                team_id TEXT NOT NULL,
                seq INTEGER NOT NULL,
                goals_for REAL NOT NULL,
                goals_against REAL NOT NULL,
                shots REAL NOT NULL,
                corners REAL NOT NULL,
                possession_pct REAL NOT NULL,
                PRIMARY KEY (team_id, seq)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS processed_fixtures (
                fixture_id TEXT PRIMARY KEY,
                processed_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ledger (
                fixture_key TEXT PRIMARY KEY,
                predicted_outcome TEXT NOT NULL,
                probability TEXT NOT NULL,
                odd TEXT NOT NULL,
                value_score TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                status TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
