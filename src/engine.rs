//! MAE/MLL decision engine. Pure arithmetic, no I/O, no hidden state.

use crate::types::{Classification, InstrumentSpec, TradeInput, ViolationResult};

/// Decide whether a flagged MLL violation was real.
///
/// `mae` is the worst-case currency loss implied by the recorded excursion
/// price; `distance_to_mll` is the loss budget left before the account floor.
/// A loss within budget means the flagging system was wrong (`Invalid`);
/// equality still classifies `Invalid`. Degenerate tick economics (zero tick
/// value or ticks-per-point) give `mae = 0` and therefore `Invalid` -- callers
/// must resolve the instrument first, this function never errors.
pub fn evaluate(trade: &TradeInput, spec: &InstrumentSpec) -> ViolationResult {
    let price_excursion = (trade.adverse_excursion_price - trade.fill_price).abs();
    let mae = -(price_excursion
        * spec.tick_value()
        * spec.ticks_per_point()
        * trade.quantity.unsigned_abs() as f64);
    let distance_to_mll = trade.balance_before - trade.mll;
    let difference = distance_to_mll + mae;
    let classification = if mae.abs() <= distance_to_mll {
        Classification::Invalid
    } else {
        Classification::ValidViolation
    };
    ViolationResult {
        mae,
        distance_to_mll,
        difference,
        classification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nq() -> InstrumentSpec {
        InstrumentSpec {
            symbol: "NQ".into(),
            value_per_point: 20.0,
            tick_size: 0.25,
        }
    }

    fn trade(adverse: f64) -> TradeInput {
        TradeInput {
            instrument: "NQ".into(),
            quantity: 2,
            fill_price: 24798.25,
            close_price: 24845.75,
            adverse_excursion_price: adverse,
            balance_before: 0.0,
            mll: -2000.0,
            violation_timestamp: None,
        }
    }

    // ---------- worked examples from the original sheet ----------

    #[test]
    fn nq_example_within_budget_is_invalid() {
        let r = evaluate(&trade(24848.00), &nq());
        assert_eq!(r.mae, -1990.0);
        assert_eq!(r.distance_to_mll, 2000.0);
        assert_eq!(r.difference, 10.0);
        assert_eq!(r.classification, Classification::Invalid);
    }

    #[test]
    fn nq_example_beyond_budget_is_valid_violation() {
        let r = evaluate(&trade(24900.00), &nq());
        assert_eq!(r.mae, -4070.0);
        assert_eq!(r.difference, -2070.0);
        assert_eq!(r.classification, Classification::ValidViolation);
    }

    // ---------- algebraic properties ----------

    #[test]
    fn mae_is_never_positive_and_zero_only_at_fill_price() {
        for adverse in [24798.25, 24800.0, 24700.0, 25000.0] {
            let r = evaluate(&trade(adverse), &nq());
            assert!(r.mae <= 0.0, "mae must be <= 0, got {}", r.mae);
            if adverse == 24798.25 {
                assert_eq!(r.mae, 0.0);
            } else {
                assert!(r.mae < 0.0);
            }
        }
    }

    #[test]
    fn difference_equals_distance_minus_abs_mae() {
        for adverse in [24810.0, 24848.0, 24900.0, 24750.5] {
            let r = evaluate(&trade(adverse), &nq());
            assert_eq!(r.difference, r.distance_to_mll - r.mae.abs());
        }
    }

    #[test]
    fn boundary_equality_classifies_invalid() {
        // distance = 2000.00; pick an excursion producing exactly |mae| = 2000:
        // 2000 / (5 * 4 * 2) = 50 points.
        let r = evaluate(&trade(24798.25 + 50.0), &nq());
        assert_eq!(r.mae, -2000.0);
        assert_eq!(r.classification, Classification::Invalid);

        // One tick past equality flips it.
        let r = evaluate(&trade(24798.25 + 50.25), &nq());
        assert_eq!(r.classification, Classification::ValidViolation);
    }

    #[test]
    fn excursion_below_fill_counts_the_same_as_above() {
        let up = evaluate(&trade(24848.00), &nq());
        let down = evaluate(&trade(24748.50), &nq());
        assert_eq!(up.mae, down.mae);
    }

    #[test]
    fn short_quantity_uses_magnitude() {
        let mut t = trade(24848.00);
        t.quantity = -2;
        let r = evaluate(&t, &nq());
        assert_eq!(r.mae, -1990.0);
    }

    #[test]
    fn degenerate_instrument_yields_zero_mae_and_invalid() {
        let sentinel = InstrumentSpec {
            symbol: "N/A".into(),
            value_per_point: 0.0,
            tick_size: 0.0,
        };
        let r = evaluate(&trade(24900.00), &sentinel);
        assert_eq!(r.mae, 0.0);
        assert_eq!(r.classification, Classification::Invalid);
    }
}
