//! Prediction model seam
//!
//! The classifier itself lives in an external service; this module
//! defines the trait the pipeline scores through, the HTTP client for
//! the hosted model, and the validated class-index mapping that ties
//! the model's output ordering to the canonical outcome labels.

pub mod service;

pub use service::PredictionService;

use crate::error::{BotError, Result};
use crate::types::Outcome;
use async_trait::async_trait;

/// Outcome-probability model scoring a batch of fixtures.
///
/// Rows of `features` are fixtures; each returned row is one
/// probability vector in the model's native class order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProbabilityModel: Send + Sync {
    async fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;
}

/// Validated class-index to outcome-label mapping.
///
/// Constructed once at startup from the model's declared class
/// ordering; detection only accepts a constructed mapping, so an
/// unvalidated ordering can never reach the detector.
#[derive(Debug, Clone)]
pub struct ClassMapping {
    order: Vec<Outcome>,
}

impl ClassMapping {
    pub fn new(order: Vec<Outcome>) -> Result<Self> {
        if order.len() != Outcome::CANONICAL.len() {
            return Err(BotError::Config(format!(
                "class_order must list {} outcomes, got {}",
                Outcome::CANONICAL.len(),
                order.len()
            )));
        }
        for outcome in Outcome::CANONICAL {
            if !order.contains(&outcome) {
                return Err(BotError::Config(format!(
                    "class_order is missing outcome {outcome}"
                )));
            }
        }
        Ok(Self { order })
    }

    pub fn class_count(&self) -> usize {
        self.order.len()
    }

    /// Index of an outcome's probability within a model output row
    pub fn index_of(&self, outcome: Outcome) -> usize {
        // Validation guarantees each canonical outcome is present
        self.order
            .iter()
            .position(|&o| o == outcome)
            .expect("validated mapping covers every canonical outcome")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_accepts_any_permutation() {
        let mapping =
            ClassMapping::new(vec![Outcome::Away, Outcome::Home, Outcome::Draw]).unwrap();
        assert_eq!(mapping.class_count(), 3);
        assert_eq!(mapping.index_of(Outcome::Away), 0);
        assert_eq!(mapping.index_of(Outcome::Home), 1);
        assert_eq!(mapping.index_of(Outcome::Draw), 2);
    }

    #[test]
    fn test_mapping_rejects_wrong_length() {
        let err = ClassMapping::new(vec![Outcome::Home, Outcome::Draw]).unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
    }

    #[test]
    fn test_mapping_rejects_duplicates() {
        let err = ClassMapping::new(vec![Outcome::Home, Outcome::Home, Outcome::Away])
            .unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
    }
}
