//! Trade velocity: how fast the tape is printing.

use crate::models::Trade;

pub fn detect_trade_velocity(trades: &[Trade]) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }
    let total_time_ms = (trades[trades.len() - 1].timestamp_ms - trades[0].timestamp_ms) as f64;
    if total_time_ms == 0.0 {
        return trades.len() as f64;
    }
    trades.len() as f64 / (total_time_ms / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;

    fn trade(ts: i64) -> Trade {
        Trade { price: 100.0, volume: 1.0, side: Side::Buy, timestamp_ms: ts }
    }

    #[test]
    fn ten_trades_over_five_seconds_is_two_per_second() {
        let trades: Vec<Trade> = (0..11).map(|i| trade(i * 500)).collect();
        assert!((detect_trade_velocity(&trades) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn single_trade_has_no_velocity() {
        assert_eq!(detect_trade_velocity(&[trade(0)]), 0.0);
    }
}
