//! Batch pipeline
//!
//! One scheduled invocation: ingest yesterday's results into history,
//! settle previously recorded signals, then score upcoming fixtures
//! and record/alert qualifying value signals. All mutable state is
//! held by this context object and flushed before the batch ends.
//!
//! Provider calls fan out through a bounded pool; history appends and
//! ledger writes stay on the batch task to keep a single writer.

use crate::client::{FinishedFixture, FixtureProvider, UpcomingFixture};
use crate::config::Config;
use crate::error::{BotError, Result};
use crate::features::FeatureAggregator;
use crate::model::ProbabilityModel;
use crate::notify::{Notifier, ValueAlert};
use crate::settlement::{self, PerformanceStats, SettlementSummary};
use crate::storage::{HistoryStore, SignalLedger};
use crate::strategy::ValueDetector;
use crate::types::{MatchObservation, Outcome};
use chrono::NaiveDate;
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// What one batch run did
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchReport {
    pub fixtures_ingested: usize,
    pub signals_recorded: usize,
    pub settlement: SettlementSummary,
}

/// Explicit pipeline context; built at batch start, torn down at end
pub struct Pipeline {
    provider: Box<dyn FixtureProvider>,
    model: Box<dyn ProbabilityModel>,
    aggregator: FeatureAggregator,
    detector: ValueDetector,
    notifier: Notifier,
    history: HistoryStore,
    ledger: SignalLedger,
    config: Config,
    dry_run: bool,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Box<dyn FixtureProvider>,
        model: Box<dyn ProbabilityModel>,
        detector: ValueDetector,
        notifier: Notifier,
        history: HistoryStore,
        ledger: SignalLedger,
        config: Config,
        dry_run: bool,
    ) -> Self {
        let aggregator = FeatureAggregator::new(config.detector.window);
        Self {
            provider,
            model,
            aggregator,
            detector,
            notifier,
            history,
            ledger,
            config,
            dry_run,
        }
    }

    pub fn ledger(&self) -> &SignalLedger {
        &self.ledger
    }

    /// Run the full batch for a given "results day" (normally yesterday)
    pub async fn run(&mut self, results_date: NaiveDate) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        let finished = self.fetch_finished(results_date).await;
        report.fixtures_ingested = self.ingest(&finished).await?;
        self.history.persist().await?;

        report.settlement = self.settle(&finished).await?;
        report.signals_recorded = self.detect_and_alert().await?;

        // Teardown: everything staged during detection is already
        // durable (ledger writes are immediate); flush any stragglers.
        self.history.persist().await?;

        info!(
            ingested = report.fixtures_ingested,
            signals = report.signals_recorded,
            settled = report.settlement.settled(),
            "batch complete"
        );
        Ok(report)
    }

    /// Finished fixtures across all configured leagues. A league that
    /// fails to fetch is skipped; its fixtures are picked up by a later
    /// run since the watermark never advanced past them.
    async fn fetch_finished(&self, date: NaiveDate) -> Vec<FinishedFixture> {
        let mut finished = Vec::new();
        for &league in &self.config.provider.leagues {
            match self.provider.finished_fixtures(league, date).await {
                Ok(fixtures) => {
                    debug!(league, count = fixtures.len(), "finished fixtures fetched");
                    finished.extend(fixtures);
                }
                Err(e) => warn!(league, error = %e, "skipping league results"),
            }
        }
        finished
    }

    /// Fold finished fixtures into per-team history, at most once per
    /// fixture across all runs.
    async fn ingest(&mut self, finished: &[FinishedFixture]) -> Result<usize> {
        let pending: Vec<&FinishedFixture> = finished
            .iter()
            .filter(|f| !self.history.is_processed(&f.fixture_id.to_string()))
            .collect();

        let provider = self.provider.as_ref();
        let stats: Vec<_> = stream::iter(pending)
            .map(|fixture| async move {
                let result = provider.fixture_statistics(fixture.fixture_id).await;
                (fixture, result)
            })
            .buffered(self.config.provider.max_concurrent_requests)
            .collect()
            .await;

        let mut ingested = 0;
        for (fixture, result) in stats {
            let boxscores = match result {
                Ok(b) => b,
                Err(e) => {
                    warn!(fixture = fixture.fixture_id, error = %e, "skipping fixture stats");
                    continue;
                }
            };

            let (Some(home), Some(away)) = (
                boxscores.get(&fixture.home_team_id),
                boxscores.get(&fixture.away_team_id),
            ) else {
                warn!(fixture = fixture.fixture_id, "boxscore missing a team, skipped");
                continue;
            };

            self.history.append(
                &fixture.home_team_id,
                MatchObservation {
                    goals_for: fixture.home_goals as f64,
                    goals_against: fixture.away_goals as f64,
                    shots: home.shots,
                    corners: home.corners,
                    possession_pct: home.possession_pct,
                },
            );
            self.history.append(
                &fixture.away_team_id,
                MatchObservation {
                    goals_for: fixture.away_goals as f64,
                    goals_against: fixture.home_goals as f64,
                    shots: away.shots,
                    corners: away.corners,
                    possession_pct: away.possession_pct,
                },
            );
            self.history.mark_processed(&fixture.fixture_id.to_string());
            ingested += 1;
        }

        Ok(ingested)
    }

    /// Settle pending ledger entries against the day's final scores
    async fn settle(&mut self, finished: &[FinishedFixture]) -> Result<SettlementSummary> {
        let results: HashMap<String, Outcome> = finished
            .iter()
            .map(|f| (f.fixture_id.to_string(), f.result()))
            .collect();

        let summary = settlement::settle(&mut self.ledger, &results).await?;

        if summary.settled() > 0 {
            let stats =
                PerformanceStats::from_entries(self.ledger.entries(), self.config.detector.stake);
            self.notifier.settlement_report(&summary, &stats).await?;
        }
        Ok(summary)
    }

    /// Score upcoming fixtures and record/alert qualifying signals
    async fn detect_and_alert(&mut self) -> Result<usize> {
        let mut upcoming = Vec::new();
        for &league in &self.config.provider.leagues {
            match self
                .provider
                .upcoming_fixtures(league, self.config.provider.upcoming_per_league)
                .await
            {
                Ok(fixtures) => upcoming.extend(fixtures),
                Err(e) => warn!(league, error = %e, "skipping league fixtures"),
            }
        }

        // Fixtures already alerted are never revisited; fixtures
        // without a full history window cannot be scored yet.
        let mut candidates: Vec<(UpcomingFixture, Vec<f64>)> = Vec::new();
        for fixture in upcoming {
            if self.ledger.has_entry(&fixture.fixture_id.to_string()) {
                debug!(fixture = fixture.fixture_id, "already alerted, skipped");
                continue;
            }
            match self.aggregator.match_features(
                &self.history,
                &fixture.home_team_id,
                &fixture.away_team_id,
            ) {
                Ok(features) => candidates.push((fixture, features)),
                Err(e @ BotError::InsufficientHistory { .. }) => {
                    debug!(fixture = fixture.fixture_id, "{e}");
                }
                Err(e) => return Err(e),
            }
        }

        if candidates.is_empty() {
            info!("no scoreable fixtures");
            return Ok(0);
        }

        let batch: Vec<Vec<f64>> = candidates.iter().map(|(_, f)| f.clone()).collect();
        let predictions = match self.model.predict(&batch).await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "prediction service failed, skipping detection");
                self.notifier.error("prediction", &e.to_string()).await?;
                return Ok(0);
            }
        };

        let provider = self.provider.as_ref();
        let quoted: Vec<_> = stream::iter(candidates.iter().zip(predictions))
            .map(|((fixture, _), probabilities)| async move {
                let odds = provider.fixture_odds(fixture.fixture_id).await;
                (fixture, probabilities, odds)
            })
            .buffered(self.config.provider.max_concurrent_requests)
            .collect()
            .await;

        let mut alerts = Vec::new();
        for (fixture, probabilities, odds) in quoted {
            let quote = match odds {
                Ok(Some(quote)) => quote,
                Ok(None) => {
                    debug!(fixture = fixture.fixture_id, "no odds quoted");
                    continue;
                }
                Err(e) => {
                    warn!(fixture = fixture.fixture_id, error = %e, "skipping fixture odds");
                    continue;
                }
            };

            let signals = match self
                .detector
                .detect(&fixture.fixture_id.to_string(), &probabilities, &quote)
            {
                Ok(signals) => signals,
                Err(e @ BotError::Prediction(_)) => {
                    warn!(fixture = fixture.fixture_id, error = %e, "skipping fixture");
                    continue;
                }
                // Config defects are not per-fixture noise
                Err(e) => return Err(e),
            };

            for signal in signals {
                info!(
                    fixture = fixture.fixture_id,
                    outcome = %signal.predicted_outcome,
                    value = %signal.value_score,
                    "value signal"
                );

                if self.dry_run {
                    continue;
                }
                match self.ledger.record(signal.clone()).await {
                    Ok(_) => alerts.push(ValueAlert {
                        fixture_label: format!("{} vs {}", fixture.home_name, fixture.away_name),
                        signal,
                    }),
                    Err(BotError::DuplicateSignal(key)) => {
                        debug!(fixture = %key, "duplicate suppressed");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if !self.dry_run {
            self.notifier
                .value_signals(&alerts, self.config.detector.max_alerts_per_message)
                .await?;
        }
        Ok(alerts.len())
    }
}
