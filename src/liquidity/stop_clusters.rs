//! Stop clusters: long-wick candles imply where the crowd's stops sit.

use crate::models::{LevelType, LiquidityKind, LiquidityLevel, Ohlcv};
use crate::util::time_decay_weight;

const WICK_RATIO_THRESHOLD: f64 = 0.6;

pub fn detect_stop_clusters(ohlcv: &Ohlcv, now_ms: i64, apply_time_decay: bool) -> Vec<LiquidityLevel> {
    let mut clusters = Vec::new();

    for bar in ohlcv.iter().skip(2) {
        let range = bar.high - bar.low;
        if range <= 0.0 {
            continue;
        }

        let upper_wick = bar.high - bar.open.max(bar.close);
        if upper_wick > range * WICK_RATIO_THRESHOLD {
            clusters.push(LiquidityLevel {
                kind: LiquidityKind::StopCluster,
                price: bar.high,
                level_type: LevelType::BuyStops,
                source: "wick".to_string(),
                timestamp_ms: bar.timestamp_ms,
                weight: decay(apply_time_decay, bar.timestamp_ms, now_ms),
            });
        }

        let lower_wick = bar.open.min(bar.close) - bar.low;
        if lower_wick > range * WICK_RATIO_THRESHOLD {
            clusters.push(LiquidityLevel {
                kind: LiquidityKind::StopCluster,
                price: bar.low,
                level_type: LevelType::SellStops,
                source: "wick".to_string(),
                timestamp_ms: bar.timestamp_ms,
                weight: decay(apply_time_decay, bar.timestamp_ms, now_ms),
            });
        }
    }

    clusters
}

fn decay(apply: bool, ts_ms: i64, now_ms: i64) -> f64 {
    if !apply {
        return 1.0;
    }
    time_decay_weight(Some((now_ms - ts_ms) as f64 / 1000.0), crate::util::DEFAULT_HALF_LIFE_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;

    fn candle(ts: i64, o: f64, h: f64, l: f64, c: f64) -> Candle {
        Candle { open: o, high: h, low: l, close: c, volume: 10.0, timestamp_ms: ts }
    }

    #[test]
    fn long_upper_wick_yields_buy_stops_above_high() {
        let ohlcv: Ohlcv = vec![
            candle(0, 100.0, 101.0, 99.0, 100.0),
            candle(1, 100.0, 101.0, 99.0, 100.0),
            candle(2, 100.0, 110.0, 99.5, 100.5),
        ];
        let clusters = detect_stop_clusters(&ohlcv, 2, false);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].level_type, LevelType::BuyStops);
        assert_eq!(clusters[0].price, 110.0);
        assert_eq!(clusters[0].weight, 1.0);
    }

    #[test]
    fn first_two_candles_are_never_scanned() {
        let ohlcv: Ohlcv = vec![candle(0, 100.0, 110.0, 99.0, 100.5)];
        assert!(detect_stop_clusters(&ohlcv, 0, false).is_empty());
    }
}
