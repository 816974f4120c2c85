//! All-time-high/low liquidity of the analyzed OHLCV window, always full weight.

use crate::models::{LevelType, LiquidityKind, LiquidityLevel, Ohlcv};

#[derive(Debug, Clone)]
pub struct AthAtl {
    pub ath: LiquidityLevel,
    pub atl: LiquidityLevel,
}

pub fn detect_ath_atl_liquidity(ohlcv: &Ohlcv) -> Option<AthAtl> {
    let high = ohlcv.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = ohlcv.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    if ohlcv.is_empty() {
        return None;
    }
    let ts = ohlcv.last().map(|c| c.timestamp_ms).unwrap_or(0);

    Some(AthAtl {
        ath: LiquidityLevel {
            kind: LiquidityKind::AthAtl,
            price: high,
            level_type: LevelType::BuyStops,
            source: "ath".to_string(),
            timestamp_ms: ts,
            weight: 1.0,
        },
        atl: LiquidityLevel {
            kind: LiquidityKind::AthAtl,
            price: low,
            level_type: LevelType::SellStops,
            source: "atl".to_string(),
            timestamp_ms: ts,
            weight: 1.0,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;

    fn candle(h: f64, l: f64) -> Candle {
        Candle { open: h, high: h, low: l, close: h, volume: 1.0, timestamp_ms: 0 }
    }

    #[test]
    fn picks_absolute_extremes_of_window() {
        let ohlcv: Ohlcv = vec![candle(100.0, 90.0), candle(120.0, 95.0), candle(110.0, 80.0)];
        let result = detect_ath_atl_liquidity(&ohlcv).unwrap();
        assert_eq!(result.ath.price, 120.0);
        assert_eq!(result.atl.price, 80.0);
    }

    #[test]
    fn empty_window_yields_none() {
        let ohlcv: Ohlcv = vec![];
        assert!(detect_ath_atl_liquidity(&ohlcv).is_none());
    }
}
