//! Value detection strategy


use crate::config::DetectorConfig;
use crate::error::{BotError, Result};
use crate::model::ClassMapping;
use crate::types::{OddsQuote, Outcome, Signal};
use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Flags outcomes whose probability x odd product clears the threshold
pub struct ValueDetector {
    threshold: Decimal,
    mapping: ClassMapping,
}

impl ValueDetector {
    pub fn new(config: &DetectorConfig, mapping: ClassMapping) -> Self {
        Self {
            threshold: config.value_threshold,
            mapping,
        }
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    /// Scan one fixture's probabilities against its odds snapshot.
    ///
    /// Outcomes are visited in canonical order so output ordering is
    /// deterministic. An outcome missing from the quote is skipped; a
    /// fixture with no odds at all yields no signals. A probability
    /// vector that does not match the class mapping is a configuration
    /// defect, not market data.
    pub fn detect(
        &self,
        fixture_key: &str,
        probabilities: &[f64],
        odds: &OddsQuote,
    ) -> Result<Vec<Signal>> {
        if probabilities.len() != self.mapping.class_count() {
            return Err(BotError::Config(format!(
                "probability vector length {} does not match class mapping ({})",
                probabilities.len(),
                self.mapping.class_count()
            )));
        }

        let mut signals = Vec::new();
        for outcome in Outcome::CANONICAL {
            let Some(odd) = odds.odd(outcome) else {
                continue;
            };

            let raw = probabilities[self.mapping.index_of(outcome)];
            let probability = Decimal::from_f64(raw).ok_or_else(|| {
                BotError::Prediction(format!(
                    "non-finite probability {raw} for {outcome} on fixture {fixture_key}"
                ))
            })?;

            let value_score = probability * odd;
            if value_score > self.threshold {
                signals.push(Signal {
                    fixture_key: fixture_key.to_string(),
                    predicted_outcome: outcome,
                    probability,
                    odd,
                    value_score,
                    timestamp: Utc::now(),
                });
            }
        }

        Ok(signals)
    }
}
