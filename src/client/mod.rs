//! API-Football provider client
//!
//! Fetches fixtures, per-team boxscore statistics and bookmaker odds.
//! Only the minimal fields the pipeline consumes are deserialized.

use crate::config::ProviderConfig;
use crate::error::{BotError, Result};
use crate::types::{OddsQuote, Outcome};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

const MATCH_WINNER_BET: &str = "Match Winner";

/// Fixture/odds provider seam; the pipeline only talks through this.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FixtureProvider: Send + Sync {
    /// Fixtures that finished (status FT) in a league on a given date
    async fn finished_fixtures(&self, league: u32, date: NaiveDate)
        -> Result<Vec<FinishedFixture>>;

    /// The next `count` scheduled fixtures in a league
    async fn upcoming_fixtures(&self, league: u32, count: u32) -> Result<Vec<UpcomingFixture>>;

    /// Per-team boxscore statistics, keyed by team id
    async fn fixture_statistics(&self, fixture_id: u64) -> Result<HashMap<String, TeamBoxscore>>;

    /// First bookmaker's match-winner odds, if quoted
    async fn fixture_odds(&self, fixture_id: u64) -> Result<Option<OddsQuote>>;
}

/// A fixture that finished with a final score
#[derive(Debug, Clone)]
pub struct FinishedFixture {
    pub fixture_id: u64,
    pub home_team_id: String,
    pub away_team_id: String,
    pub home_goals: u32,
    pub away_goals: u32,
}

impl FinishedFixture {
    pub fn result(&self) -> Outcome {
        Outcome::from_score(self.home_goals, self.away_goals)
    }
}

/// A scheduled fixture
#[derive(Debug, Clone)]
pub struct UpcomingFixture {
    pub fixture_id: u64,
    pub home_team_id: String,
    pub away_team_id: String,
    pub home_name: String,
    pub away_name: String,
}

/// One team's statistics from a finished fixture's boxscore
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamBoxscore {
    pub shots: f64,
    pub corners: f64,
    pub possession_pct: f64,
}

/// API-Football HTTP client
pub struct FootballApiClient {
    http: Client,
    base_url: String,
}

// ============ Wire shapes ============

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default = "Vec::new")]
    response: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct FixtureEnvelope {
    fixture: FixtureInfo,
    teams: FixtureTeams,
    goals: FixtureGoals,
}

#[derive(Debug, Deserialize)]
struct FixtureInfo {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct FixtureTeams {
    home: TeamRef,
    away: TeamRef,
}

#[derive(Debug, Deserialize)]
struct TeamRef {
    id: u64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct FixtureGoals {
    home: Option<u32>,
    away: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StatisticsEnvelope {
    team: TeamRef,
    statistics: Vec<StatisticEntry>,
}

#[derive(Debug, Deserialize)]
struct StatisticEntry {
    #[serde(rename = "type")]
    kind: String,
    value: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OddsEnvelope {
    bookmakers: Vec<BookmakerOdds>,
}

#[derive(Debug, Deserialize)]
struct BookmakerOdds {
    name: String,
    bets: Vec<BookmakerBet>,
}

#[derive(Debug, Deserialize)]
struct BookmakerBet {
    name: String,
    values: Vec<BetValue>,
}

#[derive(Debug, Deserialize)]
struct BetValue {
    value: String,
    odd: String,
}

impl FootballApiClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-apisports-key",
            HeaderValue::from_str(&config.api_key)
                .map_err(|_| BotError::Config("invalid provider api_key".to_string()))?,
        );

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl FixtureProvider for FootballApiClient {
    async fn finished_fixtures(
        &self,
        league: u32,
        date: NaiveDate,
    ) -> Result<Vec<FinishedFixture>> {
        let url = format!("{}/fixtures", self.base_url);
        let resp: ApiResponse<FixtureEnvelope> = self
            .http
            .get(&url)
            .query(&[
                ("league", league.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
                ("status", "FT".to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;

        Ok(resp
            .response
            .into_iter()
            .filter_map(|f| {
                Some(FinishedFixture {
                    fixture_id: f.fixture.id,
                    home_team_id: f.teams.home.id.to_string(),
                    away_team_id: f.teams.away.id.to_string(),
                    home_goals: f.goals.home?,
                    away_goals: f.goals.away?,
                })
            })
            .collect())
    }

    /// The next `count` scheduled fixtures in a league
    async fn upcoming_fixtures(&self, league: u32, count: u32) -> Result<Vec<UpcomingFixture>> {
        let url = format!("{}/fixtures", self.base_url);
        let resp: ApiResponse<FixtureEnvelope> = self
            .http
            .get(&url)
            .query(&[
                ("league", league.to_string()),
                ("next", count.to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;

        Ok(resp
            .response
            .into_iter()
            .map(|f| UpcomingFixture {
                fixture_id: f.fixture.id,
                home_team_id: f.teams.home.id.to_string(),
                away_team_id: f.teams.away.id.to_string(),
                home_name: f.teams.home.name,
                away_name: f.teams.away.name,
            })
            .collect())
    }

    /// Per-team boxscore statistics, keyed by team id
    async fn fixture_statistics(
        &self,
        fixture_id: u64,
    ) -> Result<HashMap<String, TeamBoxscore>> {
        let url = format!("{}/fixtures/statistics", self.base_url);
        let resp: ApiResponse<StatisticsEnvelope> = self
            .http
            .get(&url)
            .query(&[("fixture", fixture_id.to_string())])
            .send()
            .await?
            .json()
            .await?;

        if resp.response.is_empty() {
            return Err(BotError::Provider(format!(
                "no statistics for fixture {fixture_id}"
            )));
        }

        Ok(resp
            .response
            .into_iter()
            .map(|team_stats| {
                let boxscore = parse_boxscore(&team_stats.statistics);
                (team_stats.team.id.to_string(), boxscore)
            })
            .collect())
    }

    /// First bookmaker's match-winner odds, if quoted
    async fn fixture_odds(&self, fixture_id: u64) -> Result<Option<OddsQuote>> {
        let url = format!("{}/odds", self.base_url);
        let resp: ApiResponse<OddsEnvelope> = self
            .http
            .get(&url)
            .query(&[("fixture", fixture_id.to_string())])
            .send()
            .await?
            .json()
            .await?;

        let Some(bookmaker) = resp
            .response
            .into_iter()
            .next()
            .and_then(|e| e.bookmakers.into_iter().next())
        else {
            return Ok(None);
        };

        let Some(bet) = bookmaker.bets.into_iter().find(|b| b.name == MATCH_WINNER_BET) else {
            return Ok(None);
        };

        let mut odds = HashMap::new();
        for value in bet.values {
            let Ok(outcome) = Outcome::from_str(&value.value) else {
                continue;
            };
            let Ok(odd) = Decimal::from_str(&value.odd) else {
                continue;
            };
            odds.insert(outcome, odd);
        }

        Ok(Some(OddsQuote {
            bookmaker: bookmaker.name,
            odds,
        }))
    }
}

/// Pull the three consumed statistics out of a boxscore, defaulting the
/// way the provider's nulls are conventionally read: missing counts are
/// 0, missing possession is an even 50%.
fn parse_boxscore(entries: &[StatisticEntry]) -> TeamBoxscore {
    let mut boxscore = TeamBoxscore {
        shots: 0.0,
        corners: 0.0,
        possession_pct: 50.0,
    };

    for entry in entries {
        match entry.kind.as_str() {
            "Shots on Goal" => boxscore.shots = numeric_stat(entry.value.as_ref()),
            "Corner Kicks" => boxscore.corners = numeric_stat(entry.value.as_ref()),
            "Ball Possession" => {
                if let Some(pct) = entry.value.as_ref().and_then(percentage_stat) {
                    boxscore.possession_pct = pct;
                }
            }
            _ => {}
        }
    }

    boxscore
}

fn numeric_stat(value: Option<&serde_json::Value>) -> f64 {
    value.and_then(|v| v.as_f64()).unwrap_or(0.0)
}

/// Possession arrives as a string like "55%"
fn percentage_stat(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.trim_end_matches('%').parse().ok(),
        other => other.as_f64(),
    }
}
