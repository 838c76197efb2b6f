//! Load and validate runtime configuration.

use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Clone)]
pub struct InstrumentsCfg {
    /// CSV sheet holding `Instrument,Value per point,Tick Size` rows.
    pub store_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsCfg {
    pub feed_url: String,
    /// CSV archive with `title,Event_Time` rows; grows across merges.
    pub archive_path: String,
    pub feed_ttl_sec: u64,
    pub query_tolerance_sec: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub instruments: InstrumentsCfg,
    pub news: NewsCfg,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let s = fs::read_to_string(path)?;
        let cfg: Self = serde_yaml::from_str(&s)?;
        Ok(cfg)
    }
}

/// Admin gate: single shared secret from the environment. Unset secret means
/// the gate is closed, not open.
pub fn admin_secret_matches(input: &str) -> bool {
    match std::env::var("ADMIN_SECRET") {
        Ok(secret) if !secret.is_empty() => secret == input,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
instruments:
  store_path: data/instruments.csv
news:
  feed_url: https://example.com/calendar.xml
  archive_path: data/news_archive.csv
  feed_ttl_sec: 3600
  query_tolerance_sec: 60
"#;
        let cfg: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.instruments.store_path, "data/instruments.csv");
        assert_eq!(cfg.news.feed_ttl_sec, 3600);
        assert_eq!(cfg.news.query_tolerance_sec, 60);
    }
}
