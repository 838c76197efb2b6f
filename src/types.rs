//! Core domain types for instruments, fills, trades and news events.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use serde::{Deserialize, Serialize};

/// Tick economics for one futures instrument, as stored in the instrument sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentSpec {
    pub symbol: String,
    pub value_per_point: f64,
    pub tick_size: f64,
}

impl InstrumentSpec {
    /// Monetary value of one minimum price increment.
    pub fn tick_value(&self) -> f64 {
        self.value_per_point * self.tick_size
    }

    /// Increments per whole price point. A zero tick size yields 0 (degenerate
    /// sentinel, not an error); MAE then collapses to 0 downstream.
    pub fn ticks_per_point(&self) -> f64 {
        if self.tick_size == 0.0 {
            0.0
        } else {
            1.0 / self.tick_size
        }
    }
}

/// One partial execution: signed quantity (negative = short fill), price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Fill {
    pub quantity: f64,
    pub price: f64,
}

/// Reduction of a fill batch to net quantity and volume-weighted average price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AggregateFill {
    pub net_quantity: i64,
    pub weighted_avg_price: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
    Flat,
}

impl From<i64> for Direction {
    fn from(qty: i64) -> Self {
        match qty {
            q if q > 0 => Direction::Long,
            q if q < 0 => Direction::Short,
            _ => Direction::Flat,
        }
    }
}

/// One flagged violation to evaluate. Lives only for the duration of a single
/// evaluation; nothing here is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeInput {
    pub instrument: String,
    pub quantity: i64,
    pub fill_price: f64,
    /// Accepted for completeness of the input form; not used by the decision math.
    pub close_price: f64,
    pub adverse_excursion_price: f64,
    pub balance_before: f64,
    pub mll: f64,
    pub violation_timestamp: Option<String>,
}

impl TradeInput {
    pub fn direction(&self) -> Direction {
        Direction::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Classification {
    /// The flagging system was wrong: the worst-case loss stayed within budget.
    Invalid,
    /// The excursion really did breach the account's loss floor.
    ValidViolation,
}

/// Output of the decision engine. Pure function of TradeInput + InstrumentSpec.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ViolationResult {
    /// Worst-case currency loss at the recorded excursion price. Always <= 0.
    pub mae: f64,
    /// Loss budget remaining before the account floor: balance_before - mll.
    pub distance_to_mll: f64,
    /// Signed headroom: distance_to_mll + mae.
    pub difference: f64,
    pub classification: Classification,
}

/// A high-impact economic announcement. `event_time` is the US Eastern wall
/// clock; dedup identity is (trimmed title, calendar date), not the instant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomicEvent {
    pub title: String,
    pub event_time: NaiveDateTime,
}

impl EconomicEvent {
    /// Resolve the stored wall clock to a UTC instant. None for times that do
    /// not exist or are ambiguous in US Eastern (DST transitions).
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        New_York
            .from_local_datetime(&self.event_time)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
