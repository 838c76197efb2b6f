//! Outbound alert channel (Telegram bot API). Best-effort only: alerts are
//! operator convenience, every failure here is swallowed after a warning.

use serde_json::json;
use tracing::{debug, warn};

/// Raw user-pasted payloads are clipped before leaving the process.
const MAX_PAYLOAD_CHARS: usize = 300;

pub struct Alerter {
    client: reqwest::Client,
    bot_token: Option<String>,
    chat_id: Option<String>,
}

impl Alerter {
    /// Credentials come from the environment; either one missing disables the
    /// channel silently.
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok().filter(|s| !s.is_empty()),
            chat_id: std::env::var("TELEGRAM_CHAT_ID").ok().filter(|s| !s.is_empty()),
        }
    }

    /// Notify the operator that a pasted payload produced no usable rows.
    pub async fn notify_parse_failure(&self, context: &str, raw: &str) {
        let (Some(token), Some(chat_id)) = (&self.bot_token, &self.chat_id) else {
            debug!("alert channel not configured; skipping notification");
            return;
        };
        let text = format!("{context}\n---\n{}", truncate_payload(raw));
        let url = format!("https://api.telegram.org/bot{token}/sendMessage");
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await;
        match resp {
            Ok(r) if r.status().is_success() => {}
            Ok(r) => warn!("alert post rejected: {}", r.status()),
            Err(e) => warn!("alert post failed: {:#}", e),
        }
    }
}

fn truncate_payload(raw: &str) -> String {
    raw.chars().take(MAX_PAYLOAD_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_clipped_to_300_chars() {
        let long = "x".repeat(1000);
        assert_eq!(truncate_payload(&long).chars().count(), MAX_PAYLOAD_CHARS);
        assert_eq!(truncate_payload("short"), "short");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = "é".repeat(400);
        let t = truncate_payload(&s);
        assert_eq!(t.chars().count(), MAX_PAYLOAD_CHARS);
        assert!(t.chars().all(|c| c == 'é'));
    }
}
