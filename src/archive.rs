//! Durable news archive: append-and-dedup merges, point-in-time queries.
//!
//! One CSV sheet (`title,Event_Time`) read fully and rewritten fully after
//! each merge. Concurrent sessions merging at once race on the sheet;
//! last-writer-wins is accepted for the expected single-operator usage.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::America::Chicago;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::EconomicEvent;
use crate::utils::parse_local_timestamp;

/// Naive wall-clock format stored in the Event_Time column.
const EVENT_TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize, Deserialize)]
struct ArchiveRow {
    title: String,
    #[serde(rename = "Event_Time")]
    event_time: String,
}

pub struct NewsArchive {
    path: PathBuf,
    events: Vec<EconomicEvent>,
}

impl NewsArchive {
    /// Read the whole sheet. A missing or unreadable sheet starts empty; the
    /// archive only ever grows through merges.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let events = match read_rows(&path) {
            Ok(events) => events,
            Err(e) => {
                warn!(
                    "news archive {} unreadable ({:#}); starting empty",
                    path.display(),
                    e
                );
                Vec::new()
            }
        };
        Self { path, events }
    }

    pub fn events(&self) -> &[EconomicEvent] {
        &self.events
    }

    /// Fold a live batch into the archive. Rows with blank titles are dropped
    /// and duplicates collapse on (trimmed title, calendar date) -- same-day
    /// re-announcements of one event merge even when the feed shifts the
    /// wall-clock time slightly between refreshes. The rewrite of the sheet
    /// is fire-and-forget: a persist failure is logged, and the merged
    /// in-memory archive stays usable.
    pub fn merge(&mut self, live: &[EconomicEvent]) {
        let before = self.events.len();
        let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
        let mut merged: Vec<EconomicEvent> = Vec::new();
        for ev in self.events.iter().chain(live.iter()) {
            let title = ev.title.trim().to_string();
            if title.is_empty() {
                continue;
            }
            if seen.insert((title.clone(), ev.event_time.date())) {
                merged.push(EconomicEvent {
                    title,
                    event_time: ev.event_time,
                });
            }
        }
        self.events = merged;
        info!(
            "news archive merged: {} existing + {} live -> {} rows",
            before,
            live.len(),
            self.events.len()
        );
        if let Err(e) = self.persist() {
            warn!(
                "news archive persist failed ({:#}); merged result kept in memory",
                e
            );
        }
    }

    /// First archived event (archive order, not proximity order) within
    /// `tolerance_secs` of the given instant.
    pub fn query(
        &self,
        instant: DateTime<Utc>,
        tolerance_secs: i64,
    ) -> Option<&EconomicEvent> {
        self.events.iter().find(|ev| {
            ev.instant()
                .map(|t| (t - instant).num_seconds().abs() <= tolerance_secs)
                .unwrap_or(false)
        })
    }

    /// Proximity query against a user-typed local timestamp, interpreted as
    /// US Central. Any parse failure yields no match, never an error.
    pub fn query_local(&self, raw: &str, tolerance_secs: i64) -> Option<&EconomicEvent> {
        let naive: NaiveDateTime = parse_local_timestamp(raw)?;
        let instant = Chicago
            .from_local_datetime(&naive)
            .single()?
            .with_timezone(&Utc);
        self.query(instant, tolerance_secs)
    }

    fn persist(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut wtr = csv::Writer::from_path(&self.path)?;
        for ev in &self.events {
            wtr.serialize(ArchiveRow {
                title: ev.title.clone(),
                event_time: ev.event_time.format(EVENT_TIME_FMT).to_string(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn read_rows(path: &Path) -> anyhow::Result<Vec<EconomicEvent>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.deserialize() {
        let row: ArchiveRow = match rec {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed archive row: {e}");
                continue;
            }
        };
        if row.title.trim().is_empty() {
            continue;
        }
        let Ok(event_time) = NaiveDateTime::parse_from_str(row.event_time.trim(), EVENT_TIME_FMT)
        else {
            warn!("skipping archive row with bad Event_Time: {}", row.event_time);
            continue;
        };
        out.push(EconomicEvent {
            title: row.title.trim().to_string(),
            event_time,
        });
    }
    Ok(out)
}
