//! Mirrors retained swings as liquidity levels above/below price.

use crate::models::{LevelType, LiquidityKind, LiquidityLevel};
use crate::structure::MarketStructure;
use crate::util::time_decay_weight;

pub fn detect_swing_liquidity(
    structure: &MarketStructure,
    now_ms: i64,
    apply_time_decay: bool,
) -> Vec<LiquidityLevel> {
    let mut levels = Vec::with_capacity(structure.swings.highs.len() + structure.swings.lows.len());

    for h in &structure.swings.highs {
        levels.push(LiquidityLevel {
            kind: LiquidityKind::SwingLiquidity,
            price: h.price,
            level_type: LevelType::BuyStops,
            source: "swing_high".to_string(),
            timestamp_ms: h.timestamp_ms,
            weight: decay(apply_time_decay, h.timestamp_ms, now_ms),
        });
    }

    for l in &structure.swings.lows {
        levels.push(LiquidityLevel {
            kind: LiquidityKind::SwingLiquidity,
            price: l.price,
            level_type: LevelType::SellStops,
            source: "swing_low".to_string(),
            timestamp_ms: l.timestamp_ms,
            weight: decay(apply_time_decay, l.timestamp_ms, now_ms),
        });
    }

    levels
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
    use crate::models::SwingPoint;
    use crate::structure::Swings;

    #[test]
    fn highs_become_buy_stops_lows_become_sell_stops() {
        let mut structure = MarketStructure::default();
        structure.swings = Swings {
            highs: vec![SwingPoint { index: 1, price: 110.0, timestamp_ms: 0, significance: 1.0 }],
            lows: vec![SwingPoint { index: 2, price: 90.0, timestamp_ms: 0, significance: 1.0 }],
        };
        let levels = detect_swing_liquidity(&structure, 0, false);
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].level_type, LevelType::BuyStops);
        assert_eq!(levels[1].level_type, LevelType::SellStops);
    }
}
