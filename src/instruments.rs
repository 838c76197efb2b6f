//! Instrument registry backed by an externally editable CSV sheet.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::types::InstrumentSpec;
use crate::utils::sanitize_symbol;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),
}

/// Row shape of the external sheet. Headers must match the sheet columns.
#[derive(Debug, Serialize, Deserialize)]
struct SheetRow {
    #[serde(rename = "Instrument")]
    instrument: String,
    #[serde(rename = "Value per point")]
    value_per_point: f64,
    #[serde(rename = "Tick Size")]
    tick_size: f64,
}

/// Built-in fallback set used when the sheet is unreachable. Same instruments
/// as the original spreadsheet, expressed as (value per point, tick size).
const DEFAULT_INSTRUMENTS: &[(&str, f64, f64)] = &[
    ("NQ", 20.0, 0.25),
    ("MNQ", 2.0, 0.25),
    ("ES", 50.0, 0.25),
    ("MES", 5.0, 0.25),
    ("GC", 100.0, 0.1),
    ("MGC", 10.0, 0.1),
    ("RTY", 50.0, 0.1),
    ("YM", 5.0, 1.0),
    ("MBT", 0.1, 5.0),
    ("MYM", 0.5, 0.5),
];

/// Sentinel exposed when the sheet loads but contains no usable rows. Zero
/// tick economics keep downstream math defined (MAE collapses to 0).
const SENTINEL_SYMBOL: &str = "N/A";

pub struct InstrumentRegistry {
    store_path: PathBuf,
    specs: Vec<InstrumentSpec>,
}

impl InstrumentRegistry {
    /// Build the registry from the sheet. Unreachable sheet falls back to the
    /// built-in set with a warning; an empty sheet contracts to the sentinel.
    pub fn open(store_path: impl Into<PathBuf>) -> Self {
        let store_path = store_path.into();
        let specs = match read_sheet(&store_path) {
            Ok(rows) if rows.is_empty() => {
                warn!(
                    "instrument sheet {} has no usable rows; exposing sentinel instrument",
                    store_path.display()
                );
                vec![sentinel()]
            }
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    "instrument sheet {} unreadable ({:#}); using built-in defaults",
                    store_path.display(),
                    e
                );
                builtin_defaults()
            }
        };
        Self { store_path, specs }
    }

    /// Re-read the sheet, discarding any in-memory view.
    pub fn reload(&mut self) {
        *self = Self::open(self.store_path.clone());
    }

    /// Symbols available for selection, in sheet order.
    pub fn list(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.symbol.as_str()).collect()
    }

    pub fn resolve(&self, symbol: &str) -> Result<&InstrumentSpec, RegistryError> {
        let sym = sanitize_symbol(symbol);
        self.specs
            .iter()
            .find(|s| s.symbol == sym)
            .ok_or(RegistryError::UnknownInstrument(sym))
    }

    /// Replace the sheet contents with the cleaned row set (blank symbols
    /// dropped), then rebuild from the sheet so no partial write is cached.
    pub fn save(&mut self, rows: Vec<InstrumentSpec>) -> anyhow::Result<()> {
        let cleaned: Vec<InstrumentSpec> = rows
            .into_iter()
            .filter(|r| !r.symbol.trim().is_empty())
            .map(|r| InstrumentSpec {
                symbol: sanitize_symbol(&r.symbol),
                ..r
            })
            .collect();
        write_sheet(&self.store_path, &cleaned)?;
        self.reload();
        Ok(())
    }
}

fn sentinel() -> InstrumentSpec {
    InstrumentSpec {
        symbol: SENTINEL_SYMBOL.to_string(),
        value_per_point: 0.0,
        tick_size: 0.0,
    }
}

fn builtin_defaults() -> Vec<InstrumentSpec> {
    DEFAULT_INSTRUMENTS
        .iter()
        .map(|(sym, vpp, ts)| InstrumentSpec {
            symbol: (*sym).to_string(),
            value_per_point: *vpp,
            tick_size: *ts,
        })
        .collect()
}

fn read_sheet(path: &Path) -> anyhow::Result<Vec<InstrumentSpec>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.deserialize() {
        // Malformed rows are dropped, same policy as blank symbols.
        let row: SheetRow = match rec {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping malformed instrument row: {e}");
                continue;
            }
        };
        if row.instrument.trim().is_empty() {
            continue;
        }
        out.push(InstrumentSpec {
            symbol: sanitize_symbol(&row.instrument),
            value_per_point: row.value_per_point,
            tick_size: row.tick_size,
        });
    }
    Ok(out)
}

fn write_sheet(path: &Path, specs: &[InstrumentSpec]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    for s in specs {
        wtr.serialize(SheetRow {
            instrument: s.symbol.clone(),
            value_per_point: s.value_per_point,
            tick_size: s.tick_size,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mll-checker-test-{name}-{}", std::process::id()))
    }

    #[test]
    fn missing_sheet_falls_back_to_defaults() {
        let reg = InstrumentRegistry::open(tmp_path("missing/does-not-exist.csv"));
        let nq = reg.resolve("NQ").unwrap();
        assert_eq!(nq.tick_value(), 5.0);
        assert_eq!(nq.ticks_per_point(), 4.0);
        assert_eq!(reg.list().len(), DEFAULT_INSTRUMENTS.len());
    }

    #[test]
    fn unknown_symbol_is_a_hard_failure() {
        let reg = InstrumentRegistry::open(tmp_path("missing/does-not-exist.csv"));
        let err = reg.resolve("ZZZ").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownInstrument(s) if s == "ZZZ"));
    }

    #[test]
    fn resolve_is_case_normalized() {
        let reg = InstrumentRegistry::open(tmp_path("missing/does-not-exist.csv"));
        assert_eq!(reg.resolve(" nq ").unwrap().symbol, "NQ");
    }

    #[test]
    fn empty_sheet_contracts_to_sentinel() {
        let path = tmp_path("empty.csv");
        std::fs::write(&path, "Instrument,Value per point,Tick Size\n").unwrap();
        let reg = InstrumentRegistry::open(&path);
        assert_eq!(reg.list(), vec![SENTINEL_SYMBOL]);
        let s = reg.resolve(SENTINEL_SYMBOL).unwrap();
        assert_eq!(s.tick_value(), 0.0);
        assert_eq!(s.ticks_per_point(), 0.0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn save_filters_blank_symbols_and_rebuilds() {
        let path = tmp_path("save.csv");
        std::fs::write(&path, "Instrument,Value per point,Tick Size\nNQ,20,0.25\n").unwrap();
        let mut reg = InstrumentRegistry::open(&path);
        reg.save(vec![
            InstrumentSpec {
                symbol: "es".into(),
                value_per_point: 50.0,
                tick_size: 0.25,
            },
            InstrumentSpec {
                symbol: "   ".into(),
                value_per_point: 1.0,
                tick_size: 1.0,
            },
        ])
        .unwrap();
        assert_eq!(reg.list(), vec!["ES"]);
        assert!(reg.resolve("NQ").is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn blank_symbol_rows_dropped_on_load() {
        let path = tmp_path("blanks.csv");
        std::fs::write(
            &path,
            "Instrument,Value per point,Tick Size\nNQ,20,0.25\n ,1,1\nES,50,0.25\n",
        )
        .unwrap();
        let reg = InstrumentRegistry::open(&path);
        assert_eq!(reg.list(), vec!["NQ", "ES"]);
        std::fs::remove_file(&path).ok();
    }
}
