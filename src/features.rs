//! Feature engineering for upcoming fixtures
//!
//! Rolling statistical summaries over each team's trailing window,
//! concatenated into the flat vector the prediction service scores.

use crate::error::Result;
use crate::storage::HistoryStore;
use crate::types::OBSERVATION_WIDTH;

/// Number of f64 components in a match feature vector (home + away).
pub const MATCH_FEATURE_WIDTH: usize = OBSERVATION_WIDTH * 2;

/// Rolling-window aggregator over the history store
pub struct FeatureAggregator {
    window: usize,
}

impl FeatureAggregator {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Component-wise mean of a team's most recent window.
    ///
    /// Fails with `InsufficientHistory` when the store cannot supply
    /// the full window.
    pub fn rolling_average(
        &self,
        history: &HistoryStore,
        team_id: &str,
    ) -> Result<[f64; OBSERVATION_WIDTH]> {
        let recent = history.recent(team_id, self.window)?;

        let mut sums = [0.0; OBSERVATION_WIDTH];
        for observation in recent {
            for (sum, value) in sums.iter_mut().zip(observation.to_array()) {
                *sum += value;
            }
        }
        for sum in &mut sums {
            *sum /= recent.len() as f64;
        }
        Ok(sums)
    }

    /// Feature vector for a fixture: home-team average followed by
    /// away-team average. The prediction service was trained on this
    /// ordering; it must never be swapped.
    pub fn match_features(
        &self,
        history: &HistoryStore,
        home_id: &str,
        away_id: &str,
    ) -> Result<Vec<f64>> {
        let home = self.rolling_average(history, home_id)?;
        let away = self.rolling_average(history, away_id)?;

        let mut features = Vec::with_capacity(MATCH_FEATURE_WIDTH);
        features.extend_from_slice(&home);
        features.extend_from_slice(&away);
        Ok(features)
    }
}
