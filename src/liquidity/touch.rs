//! Touch detector: has a liquidity level been tagged in the recent tape.

use crate::models::{LevelType, LiquidityLevel, Ohlcv};

#[derive(Debug, Clone)]
pub struct TouchedLevel {
    pub price: f64,
    pub level_type: LevelType,
    pub candles_ago: usize,
    pub source: String,
}

#[derive(Debug, Clone, Default)]
pub struct TouchReport {
    pub touched: Vec<TouchedLevel>,
    pub untouched: Vec<LiquidityLevel>,
}

pub fn detect_recent_touches(ohlcv: &Ohlcv, levels: &[LiquidityLevel], lookback: usize, tolerance_pct: f64) -> TouchReport {
    if ohlcv.len() < 2 || levels.is_empty() {
        return TouchReport { touched: Vec::new(), untouched: levels.to_vec() };
    }

    let recent_start = ohlcv.len().saturating_sub(lookback.min(ohlcv.len()));
    let recent = &ohlcv[recent_start..];

    let mut touched = Vec::new();
    let mut untouched = Vec::new();

    for level in levels {
        if level.price == 0.0 {
            continue;
        }
        let tolerance = level.price * (tolerance_pct / 100.0);
        let lower = level.price - tolerance;
        let upper = level.price + tolerance;

        let mut hit_idx = None;
        for (idx, bar) in recent.iter().enumerate() {
            let hit = match level.level_type {
                LevelType::BuyStops => bar.high >= lower,
                LevelType::SellStops => bar.low <= upper,
            };
            if hit {
                hit_idx = Some(recent.len() - idx - 1);
                break;
            }
        }

        match hit_idx {
            Some(candles_ago) => touched.push(TouchedLevel {
                price: level.price,
                level_type: level.level_type,
                candles_ago,
                source: level.source.clone(),
            }),
            None => untouched.push(level.clone()),
        }
    }

    TouchReport { touched, untouched }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candle, LiquidityKind};

    fn candle(h: f64, l: f64) -> Candle {
        Candle { open: h, high: h, low: l, close: h, volume: 1.0, timestamp_ms: 0 }
    }

    #[test]
    fn buy_stops_level_is_touched_by_a_high_within_tolerance() {
        let ohlcv: Ohlcv = vec![candle(99.0, 95.0), candle(109.95, 100.0)];
        let level = LiquidityLevel {
            kind: LiquidityKind::StopCluster,
            price: 110.0,
            level_type: LevelType::BuyStops,
            source: "wick".to_string(),
            timestamp_ms: 0,
            weight: 1.0,
        };
        let report = detect_recent_touches(&ohlcv, &[level], 20, 0.2);
        assert_eq!(report.touched.len(), 1);
        assert_eq!(report.touched[0].candles_ago, 0);
    }

    #[test]
    fn untouched_level_falls_through() {
        let ohlcv: Ohlcv = vec![candle(99.0, 95.0)];
        let level = LiquidityLevel {
            kind: LiquidityKind::StopCluster,
            price: 200.0,
            level_type: LevelType::BuyStops,
            source: "wick".to_string(),
            timestamp_ms: 0,
            weight: 1.0,
        };
        let report = detect_recent_touches(&ohlcv, &[level], 20, 0.2);
        assert!(report.touched.is_empty());
        assert_eq!(report.untouched.len(), 1);
    }
}
