//! Telegram notification module
//!
//! Sends value-bet alerts and settlement reports. Delivery failure is
//! logged and swallowed; alerting must never take the batch down.

#[cfg(test)]
mod tests;

use crate::config::TelegramConfig;
use crate::error::Result;
use crate::settlement::{PerformanceStats, SettlementSummary};
use crate::types::Signal;
use reqwest::Client;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Telegram notifier
#[derive(Clone)]
pub struct Notifier {
    http: Client,
    bot_token: String,
    chat_id: String,
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct TelegramMessage {
    chat_id: String,
    text: String,
    parse_mode: String,
}

/// One alert line: fixture display label plus its qualifying signal
#[derive(Debug, Clone)]
pub struct ValueAlert {
    pub fixture_label: String,
    pub signal: Signal,
}

impl Notifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            http: Client::new(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            enabled: true,
        }
    }

    /// Create a disabled notifier (for when Telegram is not configured)
    pub fn disabled() -> Self {
        Self {
            http: Client::new(),
            bot_token: String::new(),
            chat_id: String::new(),
            enabled: false,
        }
    }

    /// Send a raw Markdown message
    pub async fn send(&self, text: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let msg = TelegramMessage {
            chat_id: self.chat_id.clone(),
            text: text.to_string(),
            parse_mode: "Markdown".to_string(),
        };

        match self.http.post(&url).json(&msg).send().await {
            Ok(response) if !response.status().is_success() => {
                let error_text = response.text().await.unwrap_or_default();
                tracing::error!("Telegram send failed: {}", error_text);
            }
            Err(e) => {
                tracing::error!("Telegram send failed: {}", e);
            }
            Ok(_) => {}
        }

        Ok(())
    }

    /// Alert about newly recorded value signals
    pub async fn value_signals(&self, alerts: &[ValueAlert], max_lines: usize) -> Result<()> {
        if alerts.is_empty() {
            return Ok(());
        }
        self.send(&format_value_alerts(alerts, max_lines)).await
    }

    /// Report a settlement pass and overall performance
    pub async fn settlement_report(
        &self,
        summary: &SettlementSummary,
        stats: &PerformanceStats,
    ) -> Result<()> {
        self.send(&format_settlement_report(summary, stats)).await
    }

    /// Notify batch startup
    pub async fn startup(&self, leagues: usize, dry_run: bool) -> Result<()> {
        let mode = if dry_run { "DRY RUN 🧪" } else { "LIVE 🔥" };
        let text = format!(
            "🤖 *Value-Bet Batch Started*\n\n\
            Mode: {}\n\
            Leagues: {}\n\
            Time: {}",
            mode,
            leagues,
            chrono::Utc::now().format("%Y-%m-%d %H:%M UTC"),
        );

        self.send(&text).await
    }

    /// Notify about an error
    pub async fn error(&self, context: &str, error: &str) -> Result<()> {
        let text = format!(
            "⚠️ *Error*\n\n\
            Context: {}\n\
            Error: `{}`",
            context,
            truncate(error, 200),
        );

        self.send(&text).await
    }
}

fn format_value_alerts(alerts: &[ValueAlert], max_lines: usize) -> String {
    let lines: Vec<String> = alerts
        .iter()
        .take(max_lines)
        .map(|alert| {
            format!(
                "⚽️ *{}*\n🎯 Bet: {} | Odd: {} | Score: {:.2}",
                truncate(&alert.fixture_label, 80),
                alert.signal.predicted_outcome,
                alert.signal.odd,
                alert.signal.value_score,
            )
        })
        .collect();

    let mut text = format!("🚀 *NEW VALUE BETS*\n\n{}", lines.join("\n\n"));
    if alerts.len() > max_lines {
        text.push_str(&format!("\n\n(+{} more)", alerts.len() - max_lines));
    }
    text
}

fn format_settlement_report(summary: &SettlementSummary, stats: &PerformanceStats) -> String {
    let pnl_emoji = if stats.profit >= rust_decimal::Decimal::ZERO {
        "📈"
    } else {
        "📉"
    };

    format!(
        "📊 *Settlement Report*\n\n\
        Newly settled: {} ({} W / {} L)\n\n\
        All-time: {} bets\n\
        Win Rate: `{:.1}%`\n\
        {} Profit: `{:+.2}` (ROI `{:+.1}%`)",
        summary.settled(),
        summary.wins,
        summary.losses,
        stats.settled,
        stats.win_rate * dec!(100),
        pnl_emoji,
        stats.profit,
        stats.roi * dec!(100),
    )
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() > max_len {
        format!("{}...", &s[..max_len])
    } else {
        s.to_string()
    }
}
