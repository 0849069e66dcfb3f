//! Core domain types shared across the pipeline

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Number of statistics recorded per team per finished match.
pub const OBSERVATION_WIDTH: usize = 5;

/// One team's statistics from one finished match.
///
/// Stored append-only per team; insertion order is chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchObservation {
    pub goals_for: f64,
    pub goals_against: f64,
    pub shots: f64,
    pub corners: f64,
    pub possession_pct: f64,
}

impl MatchObservation {
    pub fn to_array(self) -> [f64; OBSERVATION_WIDTH] {
        [
            self.goals_for,
            self.goals_against,
            self.shots,
            self.corners,
            self.possession_pct,
        ]
    }

    pub fn from_array(values: [f64; OBSERVATION_WIDTH]) -> Self {
        Self {
            goals_for: values[0],
            goals_against: values[1],
            shots: values[2],
            corners: values[3],
            possession_pct: values[4],
        }
    }
}

/// Canonical match outcome labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

impl Outcome {
    /// Canonical iteration order; detection output ordering depends on it.
    pub const CANONICAL: [Outcome; 3] = [Outcome::Home, Outcome::Draw, Outcome::Away];

    /// Outcome of a finished fixture from the final score.
    pub fn from_score(home_goals: u32, away_goals: u32) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => Outcome::Home,
            std::cmp::Ordering::Equal => Outcome::Draw,
            std::cmp::Ordering::Less => Outcome::Away,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Home => "Home",
            Outcome::Draw => "Draw",
            Outcome::Away => "Away",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Home" => Ok(Outcome::Home),
            "Draw" => Ok(Outcome::Draw),
            "Away" => Ok(Outcome::Away),
            other => Err(format!("unknown outcome label: {other}")),
        }
    }
}

/// One bookmaker's outcome prices for one fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OddsQuote {
    pub bookmaker: String,
    pub odds: HashMap<Outcome, Decimal>,
}

impl OddsQuote {
    pub fn odd(&self, outcome: Outcome) -> Option<Decimal> {
        self.odds.get(&outcome).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.odds.is_empty()
    }
}

/// A qualifying value opportunity, ready to be recorded and alerted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub fixture_key: String,
    pub predicted_outcome: Outcome,
    pub probability: Decimal,
    pub odd: Decimal,
    pub value_score: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Lifecycle of a recorded signal. Win and Loss are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalStatus {
    Pending,
    Win,
    Loss,
}

impl SignalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Pending => "Pending",
            SignalStatus::Win => "Win",
            SignalStatus::Loss => "Loss",
        }
    }
}

impl FromStr for SignalStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(SignalStatus::Pending),
            "Win" => Ok(SignalStatus::Win),
            "Loss" => Ok(SignalStatus::Loss),
            other => Err(format!("unknown signal status: {other}")),
        }
    }
}

/// A signal plus its settlement state. One lifetime entry per fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub signal: Signal,
    pub status: SignalStatus,
}

impl LedgerEntry {
    pub fn is_settled(&self) -> bool {
        self.status != SignalStatus::Pending
    }
}
