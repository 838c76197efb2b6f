//! Live economic-calendar feed: fetch, filter, and a TTL cache.
//!
//! The feed is best-effort enrichment. Every network or parse fault degrades
//! to an empty event set; the decision engine never depends on it.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::types::EconomicEvent;

/// The feed blocks default client UAs; send a browser-like one.
const BROWSER_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0 Safari/537.36";

#[derive(Debug, Deserialize)]
struct WeeklyEvents {
    #[serde(rename = "event", default)]
    events: Vec<RawEvent>,
}

/// Raw `<event>` element. Missing children default to empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEvent {
    title: String,
    country: String,
    date: String,
    time: String,
    impact: String,
}

impl RawEvent {
    /// Keep only USD / High-impact events with an exact wall-clock time,
    /// interpreted as US Eastern. All-day and tentative rows have no instant.
    fn into_event(self) -> Option<EconomicEvent> {
        if !self.country.trim().eq_ignore_ascii_case("USD") {
            return None;
        }
        if !self.impact.trim().eq_ignore_ascii_case("High") {
            return None;
        }
        let time = self.time.trim().to_ascii_lowercase();
        if time.is_empty() || time.contains("day") || time.contains("tentative") {
            return None;
        }
        let date = NaiveDate::parse_from_str(self.date.trim(), "%m-%d-%Y").ok()?;
        let time = NaiveTime::parse_from_str(&time, "%I:%M%p").ok()?;
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return None;
        }
        Some(EconomicEvent {
            title,
            event_time: date.and_time(time),
        })
    }
}

fn parse_calendar_xml(xml: &str) -> anyhow::Result<Vec<EconomicEvent>> {
    let weekly: WeeklyEvents = quick_xml::de::from_str(xml)?;
    Ok(weekly
        .events
        .into_iter()
        .filter_map(RawEvent::into_event)
        .collect())
}

/// Fetch this week's high-impact USD events. Fails soft: any fault yields an
/// empty vec after a warning, never an error.
pub async fn fetch_live(client: &reqwest::Client, url: &str) -> Vec<EconomicEvent> {
    match try_fetch(client, url).await {
        Ok(events) => {
            info!("calendar feed returned {} high-impact USD events", events.len());
            events
        }
        Err(e) => {
            warn!("calendar feed unavailable, continuing without news: {:#}", e);
            Vec::new()
        }
    }
}

async fn try_fetch(client: &reqwest::Client, url: &str) -> anyhow::Result<Vec<EconomicEvent>> {
    let body = client
        .get(url)
        .header(reqwest::header::USER_AGENT, BROWSER_UA)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_calendar_xml(&body)
}

/// Memoized feed state with a TTL window. The feed takes no parameters, so
/// the key is the window itself; `invalidate` backs the admin refresh action.
pub struct FeedCache {
    ttl: Duration,
    fetched_at: Option<Instant>,
    events: Vec<EconomicEvent>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            fetched_at: None,
            events: Vec::new(),
        }
    }

    pub fn invalidate(&mut self) {
        self.fetched_at = None;
        self.events.clear();
    }

    fn is_fresh(&self) -> bool {
        self.fetched_at
            .map(|t| t.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// Return cached events while fresh; otherwise hit the feed once and
    /// stamp the window (an empty failed fetch is cached too, so repeated
    /// calls within the TTL never re-hit the network).
    pub async fn get_or_fetch(&mut self, client: &reqwest::Client, url: &str) -> &[EconomicEvent] {
        if !self.is_fresh() {
            self.events = fetch_live(client, url).await;
            self.fetched_at = Some(Instant::now());
        }
        &self.events
    }
}
