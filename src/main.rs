//! Entry point. Wires Config -> Registry -> Fills -> Engine -> News archive.
//! Stands in for the external presentation layer: reads one evaluation
//! request from YAML, prints the verdict and any nearby high-impact news.

mod alert;
mod archive;
mod config;
mod engine;
mod fills;
mod instruments;
mod news;
mod types;
mod utils;

use dotenvy::dotenv;
use serde::Deserialize;
use std::{fs, time::Duration};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use crate::alert::Alerter;
use crate::archive::NewsArchive;
use crate::instruments::InstrumentRegistry;
use crate::news::FeedCache;
use crate::types::{Classification, InstrumentSpec, TradeInput, ViolationResult};
use crate::utils::format_usd;

#[derive(Debug, Deserialize)]
struct TradeRequest {
    #[serde(flatten)]
    trade: TradeInput,
    /// Raw multi-line execution paste. When present, the aggregated batch
    /// overrides `quantity` and `fill_price`.
    fills_paste: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let cfg = config::AppConfig::load("config.yaml")?;

    // Admin action: force a feed refresh + archive merge, bypassing the TTL.
    // Usage: mll-checker refresh-news <admin-secret>
    let mut args = std::env::args().skip(1);
    let first = args.next();
    if first.as_deref() == Some("refresh-news") {
        let secret = args.next().unwrap_or_default();
        if !config::admin_secret_matches(&secret) {
            anyhow::bail!("admin secret mismatch");
        }
        return refresh_news(&cfg).await;
    }

    let trade_path = first.unwrap_or_else(|| "trade.yaml".to_string());
    let req: TradeRequest = serde_yaml::from_str(&fs::read_to_string(&trade_path)?)?;
    let mut trade = req.trade;

    let registry = InstrumentRegistry::open(&cfg.instruments.store_path);
    let alerter = Alerter::from_env();

    if let Some(paste) = req.fills_paste.as_deref() {
        let layout = fills::detect_layout(paste);
        let rows = fills::parse_delimited_rows(paste, layout);
        if rows.is_empty() {
            error!("pasted executions produced zero usable rows ({layout:?} layout)");
            alerter
                .notify_parse_failure("fill paste produced zero usable rows", paste)
                .await;
            anyhow::bail!("no usable fill rows in pasted executions");
        }
        let agg = fills::aggregate(&rows)?;
        info!(
            "aggregated {} fills: net qty {}, avg price {:.2}",
            rows.len(),
            agg.net_quantity,
            agg.weighted_avg_price
        );
        trade.quantity = agg.net_quantity;
        trade.fill_price = agg.weighted_avg_price;
    }

    let spec = registry.resolve(&trade.instrument)?.clone();
    let result = engine::evaluate(&trade, &spec);
    print_report(&trade, &spec, &result);

    // News reconciliation is best-effort enrichment; it never changes the
    // verdict printed above.
    let client = reqwest::Client::new();
    let mut cache = FeedCache::new(Duration::from_secs(cfg.news.feed_ttl_sec));
    let live = cache.get_or_fetch(&client, &cfg.news.feed_url).await.to_vec();
    let mut news_archive = NewsArchive::load(&cfg.news.archive_path);
    news_archive.merge(&live);

    if let Some(ts) = trade.violation_timestamp.as_deref() {
        match news_archive.query_local(ts, cfg.news.query_tolerance_sec) {
            Some(ev) => println!(
                "High-impact news near violation: {} at {} ET",
                ev.title, ev.event_time
            ),
            None => println!(
                "No high-impact news within {}s of the violation.",
                cfg.news.query_tolerance_sec
            ),
        }
    }

    Ok(())
}

async fn refresh_news(cfg: &config::AppConfig) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    // A fresh cache is cold, so this always hits the feed.
    let mut cache = FeedCache::new(Duration::from_secs(cfg.news.feed_ttl_sec));
    let live = cache.get_or_fetch(&client, &cfg.news.feed_url).await.to_vec();
    let mut news_archive = NewsArchive::load(&cfg.news.archive_path);
    news_archive.merge(&live);
    info!(
        "news refresh complete: archive holds {} events",
        news_archive.events().len()
    );
    Ok(())
}

fn print_report(trade: &TradeInput, spec: &InstrumentSpec, result: &ViolationResult) {
    println!("Instrument: {} ({:?})", spec.symbol, trade.direction());
    println!("Tick Value: {}", spec.tick_value());
    println!("Ticks per Pt: {}", spec.ticks_per_point());
    println!("MAE: {}", format_usd(result.mae));
    println!("Distance to MLL: {}", format_usd(result.distance_to_mll));
    println!("Difference: {}", format_usd(result.difference));
    match result.classification {
        Classification::Invalid => {
            println!("Status: Invalid - the loss did not exceed the MLL distance.")
        }
        Classification::ValidViolation => {
            println!("Status: Valid Violation - the MLL limit was breached!")
        }
    }
}
