//! Net signed volume across a trade buffer.

use crate::models::{Side, Trade};
use crate::util::normalize_delta_on_atr;

pub fn compute_delta(trades: &[Trade]) -> f64 {
    trades.iter().fold(0.0, |acc, t| match t.side {
        Side::Buy => acc + t.volume,
        Side::Sell => acc - t.volume,
    })
}

/// `delta` scaled by `0.5 / max(atr_pct, 0.1)` so the same raw delta counts
/// for more in a quiet market.
pub fn compute_delta_normalized(trades: &[Trade], atr_pct: f64) -> f64 {
    let delta = compute_delta(trades);
    normalize_delta_on_atr(delta, atr_pct, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(side: Side, vol: f64) -> Trade {
        Trade { price: 100.0, volume: vol, side, timestamp_ms: 0 }
    }

    #[test]
    fn buys_and_sells_offset() {
        let trades = vec![trade(Side::Buy, 10.0), trade(Side::Sell, 4.0)];
        assert_eq!(compute_delta(&trades), 6.0);
    }

    #[test]
    fn empty_buffer_is_zero() {
        assert_eq!(compute_delta(&[]), 0.0);
    }
}
