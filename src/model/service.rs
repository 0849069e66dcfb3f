//! HTTP client for the hosted prediction service

use super::ProbabilityModel;
use crate::config::ModelConfig;
use crate::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Client for the external classifier service
pub struct PredictionService {
    http: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    features: &'a [Vec<f64>],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

impl PredictionService {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Probe the service health endpoint
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/", self.base_url);
        let resp: HealthResponse = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::Prediction(format!("health probe failed: {e}")))?
            .json()
            .await
            .map_err(|e| BotError::Prediction(format!("health probe failed: {e}")))?;

        if resp.status != "ok" {
            return Err(BotError::Prediction(format!(
                "service unhealthy: {}",
                resp.status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ProbabilityModel for PredictionService {
    async fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/predict", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&PredictRequest { features })
            .send()
            .await
            .map_err(|e| BotError::Prediction(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Prediction(format!(
                "prediction service returned {}",
                response.status()
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| BotError::Prediction(e.to_string()))?;

        if parsed.predictions.len() != features.len() {
            return Err(BotError::Prediction(format!(
                "row count mismatch: sent {} fixtures, got {} predictions",
                features.len(),
                parsed.predictions.len()
            )));
        }

        Ok(parsed.predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome;

    #[test]
    fn test_request_serialization() {
        let batch = vec![vec![1.4, 1.0, 4.4, 3.6, 52.6, 0.8, 1.2, 3.1, 2.9, 47.0]];
        let json = serde_json::to_string(&PredictRequest { features: &batch }).unwrap();
        assert!(json.starts_with(r#"{"features":[["#));
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"predictions": [[0.5, 0.3, 0.2], [0.1, 0.2, 0.7]]}"#;
        let parsed: PredictResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.predictions.len(), 2);
        assert_eq!(parsed.predictions[0].len(), Outcome::CANONICAL.len());
    }
}
