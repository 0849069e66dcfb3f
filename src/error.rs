//! Error types for the value-bet pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("insufficient history for team {team_id}: have {have}, need {need}")]
    InsufficientHistory {
        team_id: String,
        have: usize,
        need: usize,
    },

    #[error("provider request failed: {0}")]
    Provider(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("prediction failed: {0}")]
    Prediction(String),

    #[error("duplicate signal for fixture {0}")]
    DuplicateSignal(String),

    #[error("corrupt persisted state: {0}")]
    CorruptState(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("notification error: {0}")]
    Notify(String),
}

impl BotError {
    /// Recoverable errors are contained to the fixture (or league) that
    /// produced them; the batch continues past them.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BotError::InsufficientHistory { .. }
                | BotError::Provider(_)
                | BotError::Network(_)
                | BotError::Prediction(_)
                | BotError::DuplicateSignal(_)
                | BotError::Notify(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let err = BotError::InsufficientHistory {
            team_id: "33".to_string(),
            have: 3,
            need: 5,
        };
        assert!(err.is_recoverable());
        assert!(BotError::DuplicateSignal("f1".to_string()).is_recoverable());
        assert!(!BotError::CorruptState("bad row".to_string()).is_recoverable());
        assert!(!BotError::Config("missing class_order".to_string()).is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = BotError::InsufficientHistory {
            team_id: "157".to_string(),
            have: 2,
            need: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient history for team 157: have 2, need 5"
        );
    }
}
