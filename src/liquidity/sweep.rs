//! Liquidity sweeps: a level gets pierced and the market snaps back.
//!
//! `detect_breakout` has no surviving reference implementation in the
//! distilled source (`liquidity_engine.py` imports it but its defining module
//! was not retained) — built from the prose description alone.

use crate::models::{Direction, Ohlcv};

const PIERCE_CLOSE_TOLERANCE: f64 = 0.002;
const HISTORICAL_RECOVERY_TOLERANCE: f64 = 0.002;
const NO_RETEST_PROXIMITY: f64 = 0.005;
const NO_RETEST_MIN_BARS: usize = 5;

#[derive(Debug, Clone)]
pub struct SweptPriceHit {
    pub price: f64,
    pub direction: Direction,
    pub hit_liquidity: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    pub sweep_up: bool,
    pub sweep_down: bool,
    pub hit_liquidity_above: bool,
    pub hit_liquidity_below: bool,
    pub post_reversal: bool,
    pub post_move: f64,
    pub swept_prices: Vec<SweptPriceHit>,
}

/// Compares the last three bars against the preceding `lookback` bars.
pub fn detect_sweep(ohlcv: &Ohlcv, lookback: usize, stop_prices_above: &[f64], stop_prices_below: &[f64]) -> SweepReport {
    let n = ohlcv.len();
    if n < lookback + 3 {
        return SweepReport::default();
    }

    let window_start = n - lookback - 3;
    let window_end = n - 3;
    let historical_high = ohlcv[window_start..window_end].iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let historical_low = ohlcv[window_start..window_end].iter().map(|c| c.low).fold(f64::MAX, f64::min);

    let last_three = &ohlcv[n - 3..n];
    let last = last_three[2];

    let sweep_up = last_three.iter().any(|b| b.high > historical_high)
        && last_three.iter().any(|b| b.close <= historical_high * (1.0 - PIERCE_CLOSE_TOLERANCE));
    let sweep_down = last_three.iter().any(|b| b.low < historical_low)
        && last_three.iter().any(|b| b.close >= historical_low * (1.0 + PIERCE_CLOSE_TOLERANCE));

    let mut hit_above = false;
    for &p in stop_prices_above {
        if last.high >= p && p >= last.close {
            hit_above = true;
            break;
        }
    }
    let mut hit_below = false;
    for &p in stop_prices_below {
        if last.low <= p && p <= last.close {
            hit_below = true;
            break;
        }
    }

    let mut post_reversal = false;
    let mut post_move = 0.0;
    let mut swept_prices = Vec::new();

    if sweep_up {
        post_move = historical_high - last.close;
        if last.close < historical_high * (1.0 - PIERCE_CLOSE_TOLERANCE) {
            post_reversal = true;
        }
        swept_prices.push(SweptPriceHit { price: historical_high, direction: Direction::Up, hit_liquidity: hit_above });
    }
    if sweep_down {
        post_move = last.close - historical_low;
        if last.close > historical_low * (1.0 + PIERCE_CLOSE_TOLERANCE) {
            post_reversal = true;
        }
        swept_prices.push(SweptPriceHit { price: historical_low, direction: Direction::Down, hit_liquidity: hit_below });
    }

    SweepReport {
        sweep_up,
        sweep_down,
        hit_liquidity_above: hit_above,
        hit_liquidity_below: hit_below,
        post_reversal,
        post_move,
        swept_prices,
    }
}

#[derive(Debug, Clone)]
pub struct HistoricalSweep {
    pub price: f64,
    pub direction: Direction,
    pub swept_at_index: usize,
    pub recovery_confirmed: bool,
    pub is_swing_high: bool,
    pub candles_ago: usize,
}

pub fn detect_historical_sweeps(
    ohlcv: &Ohlcv,
    swing_highs: &[crate::models::SwingPoint],
    swing_lows: &[crate::models::SwingPoint],
    current_price: f64,
    lookback_candles: usize,
) -> Vec<HistoricalSweep> {
    let mut out = Vec::new();
    if ohlcv.len() < 10 {
        return out;
    }

    let n = ohlcv.len();
    let start_idx = n.saturating_sub(lookback_candles);

    for swing in swing_lows {
        if swing.index < start_idx || swing.price >= current_price {
            continue;
        }
        if let Some(sweep) = scan_sweep_down(ohlcv, swing.index, swing.price) {
            out.push(sweep);
        }
    }

    for swing in swing_highs {
        if swing.index < start_idx || swing.price <= current_price {
            continue;
        }
        if let Some(sweep) = scan_sweep_up(ohlcv, swing.index, swing.price) {
            out.push(sweep);
        }
    }

    out
}

fn scan_sweep_down(ohlcv: &Ohlcv, swing_idx: usize, swing_price: f64) -> Option<HistoricalSweep> {
    let n = ohlcv.len();
    let mut swept_idx = None;

    for i in (swing_idx + 1)..n {
        let candle = ohlcv[i];
        if swept_idx.is_none() && candle.low < swing_price {
            swept_idx = Some(i);
        }
        if let Some(si) = swept_idx {
            if candle.close > swing_price * (1.0 + HISTORICAL_RECOVERY_TOLERANCE) {
                if no_retest(ohlcv, i, swing_price) {
                    return Some(HistoricalSweep {
                        price: swing_price,
                        direction: Direction::Down,
                        swept_at_index: si,
                        recovery_confirmed: true,
                        is_swing_high: false,
                        candles_ago: n - si,
                    });
                }
                return None;
            }
        }
    }
    None
}

fn scan_sweep_up(ohlcv: &Ohlcv, swing_idx: usize, swing_price: f64) -> Option<HistoricalSweep> {
    let n = ohlcv.len();
    let mut swept_idx = None;

    for i in (swing_idx + 1)..n {
        let candle = ohlcv[i];
        if swept_idx.is_none() && candle.high > swing_price {
            swept_idx = Some(i);
        }
        if let Some(si) = swept_idx {
            if candle.close < swing_price * (1.0 - HISTORICAL_RECOVERY_TOLERANCE) {
                if no_retest(ohlcv, i, swing_price) {
                    return Some(HistoricalSweep {
                        price: swing_price,
                        direction: Direction::Up,
                        swept_at_index: si,
                        recovery_confirmed: true,
                        is_swing_high: true,
                        candles_ago: n - si,
                    });
                }
                return None;
            }
        }
    }
    None
}

fn no_retest(ohlcv: &Ohlcv, from_idx: usize, level_price: f64) -> bool {
    let n = ohlcv.len();
    if from_idx + NO_RETEST_MIN_BARS >= n {
        return true;
    }
    for j in (from_idx + NO_RETEST_MIN_BARS)..n {
        if ((ohlcv[j].close - level_price) / level_price).abs() < NO_RETEST_PROXIMITY {
            return false;
        }
    }
    true
}

#[derive(Debug, Clone, Default)]
pub struct BreakoutReport {
    pub breakout: bool,
    pub strong_breakout: bool,
    pub weak_breakout: bool,
    pub consolidation_candles: usize,
}

const CONSOLIDATION_TOLERANCE: f64 = 0.005;
const MAX_CONSOLIDATION_SCAN: usize = 20;

pub fn detect_breakout(ohlcv: &Ohlcv, level: f64, direction: Direction, lookback: usize) -> BreakoutReport {
    let n = ohlcv.len();
    if n < lookback || level == 0.0 {
        return BreakoutReport::default();
    }

    let window = &ohlcv[n - lookback..];
    let on_side = |close: f64| match direction {
        Direction::Up => close > level,
        Direction::Down => close < level,
        Direction::Neutral => false,
    };

    let agreeing = window.iter().filter(|b| on_side(b.close)).count();
    let strong_breakout = agreeing == lookback;
    let weak_breakout = agreeing * 3 >= lookback * 2;

    let pre_window_end = n - lookback;
    let mut consolidation_candles = 0;
    for i in (0..pre_window_end).rev() {
        if consolidation_candles >= MAX_CONSOLIDATION_SCAN {
            break;
        }
        let bar = ohlcv[i];
        if ((bar.high - level) / level).abs() < CONSOLIDATION_TOLERANCE
            || ((bar.low - level) / level).abs() < CONSOLIDATION_TOLERANCE
        {
            consolidation_candles += 1;
        } else {
            break;
        }
    }

    BreakoutReport {
        breakout: weak_breakout,
        strong_breakout,
        weak_breakout,
        consolidation_candles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;

    fn candle(ts: i64, h: f64, l: f64, c: f64) -> Candle {
        Candle { open: c, high: h, low: l, close: c, volume: 10.0, timestamp_ms: ts }
    }

    #[test]
    fn sweep_up_requires_pierce_and_close_back_below() {
        let mut ohlcv: Ohlcv = (0..50).map(|i| candle(i, 101.0, 99.0, 100.0)).collect();
        ohlcv.push(candle(50, 100.5, 99.0, 100.0));
        ohlcv.push(candle(51, 100.5, 99.0, 100.0));
        ohlcv.push(candle(52, 105.0, 100.0, 100.6));
        let report = detect_sweep(&ohlcv, 50, &[], &[]);
        assert!(report.sweep_up);
        assert!(report.post_reversal);
    }

    #[test]
    fn too_short_history_yields_no_sweep() {
        let ohlcv: Ohlcv = vec![candle(0, 100.0, 99.0, 99.5)];
        let report = detect_sweep(&ohlcv, 50, &[], &[]);
        assert!(!report.sweep_up && !report.sweep_down);
    }

    #[test]
    fn strong_breakout_needs_all_three_closes_agreeing() {
        let ohlcv: Ohlcv = vec![
            candle(0, 99.0, 98.0, 98.5),
            candle(1, 99.0, 98.0, 98.5),
            candle(2, 101.0, 100.0, 100.5),
            candle(3, 102.0, 100.5, 101.0),
            candle(4, 103.0, 101.0, 102.0),
        ];
        let report = detect_breakout(&ohlcv, 100.0, Direction::Up, 3);
        assert!(report.strong_breakout);
    }
}
