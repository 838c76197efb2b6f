//! Parse pasted partial executions and reduce them to one aggregate fill.
//! Supported layouts: full broker export rows, or bare "qty price" pairs.

use thiserror::Error;

use crate::types::{AggregateFill, Fill};
use crate::utils::clean_numeric_token;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FillError {
    #[error("no usable fill rows")]
    EmptyInput,
    #[error("fills net to zero quantity; cannot compute average price")]
    ZeroNetQuantity,
}

/// The two paste layouts, distinguished by field count per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteLayout {
    /// Tab-delimited broker export with >= 11 columns; quantity is column 7,
    /// price column 10 (zero-based).
    BrokerExport,
    /// Two whitespace-separated tokens: quantity then price.
    SimplePair,
}

/// Column positions within a broker export row.
const BROKER_MIN_FIELDS: usize = 11;
const BROKER_QTY_IDX: usize = 7;
const BROKER_PRICE_IDX: usize = 10;

/// Pick the layout from the first non-blank line. Deterministic structural
/// test: a full export row always carries at least 11 tab-separated fields.
pub fn detect_layout(text: &str) -> PasteLayout {
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.split('\t').count() >= BROKER_MIN_FIELDS {
            return PasteLayout::BrokerExport;
        }
        return PasteLayout::SimplePair;
    }
    PasteLayout::SimplePair
}

/// Best-effort extraction: lines that do not yield two valid numbers, or whose
/// quantity is zero, are dropped without error. The caller surfaces "zero rows
/// extracted" as the user-facing failure.
pub fn parse_delimited_rows(text: &str, layout: PasteLayout) -> Vec<Fill> {
    text.lines()
        .filter_map(|line| parse_line(line, layout))
        .collect()
}

fn parse_line(line: &str, layout: PasteLayout) -> Option<Fill> {
    let (qty_tok, price_tok) = match layout {
        PasteLayout::BrokerExport => {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < BROKER_MIN_FIELDS {
                return None;
            }
            (fields[BROKER_QTY_IDX], fields[BROKER_PRICE_IDX])
        }
        PasteLayout::SimplePair => {
            let toks: Vec<&str> = line.split_whitespace().collect();
            if toks.len() != 2 {
                return None;
            }
            (toks[0], toks[1])
        }
    };
    let quantity = clean_numeric_token(qty_tok)?;
    let price = clean_numeric_token(price_tok)?;
    if quantity == 0.0 {
        return None;
    }
    Some(Fill { quantity, price })
}

/// Reduce a fill batch to net quantity and volume-weighted average price.
/// Rows with non-positive price or zero quantity are discarded first
/// (quantity may be negative: short fills).
pub fn aggregate(fills: &[Fill]) -> Result<AggregateFill, FillError> {
    let valid: Vec<&Fill> = fills
        .iter()
        .filter(|f| f.price > 0.0 && f.quantity != 0.0)
        .collect();
    if valid.is_empty() {
        return Err(FillError::EmptyInput);
    }
    let net: f64 = valid.iter().map(|f| f.quantity).sum();
    if net == 0.0 {
        return Err(FillError::ZeroNetQuantity);
    }
    let notional: f64 = valid.iter().map(|f| f.quantity * f.price).sum();
    Ok(AggregateFill {
        net_quantity: net.round() as i64,
        weighted_avg_price: notional / net,
    })
}
