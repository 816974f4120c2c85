//! Where the liquidity sits, and therefore where price is pulled.
//!
//! Supersedes the distilled source's `detect_liquidity_direction`, which
//! just counted levels; this sums time-decayed weight and applies a 10%
//! hysteresis band before committing to a direction.

use crate::liquidity::ath_atl::AthAtl;
use crate::models::{Direction, LevelType, LiquidityLevel};

const HYSTERESIS: f64 = 1.1;

#[derive(Debug, Clone, Copy, Default)]
pub struct LiquidityDirectionReport {
    pub direction: Direction,
    pub up_liq: f64,
    pub down_liq: f64,
}

pub fn detect_liquidity_direction(
    stop_clusters: &[LiquidityLevel],
    swing_liquidity: &[LiquidityLevel],
    ath_atl: Option<&AthAtl>,
    current_price: f64,
) -> LiquidityDirectionReport {
    let mut up_liq = 0.0;
    let mut down_liq = 0.0;

    for level in stop_clusters.iter().chain(swing_liquidity.iter()) {
        match level.level_type {
            LevelType::BuyStops if level.price > current_price => up_liq += level.weight,
            LevelType::SellStops if level.price < current_price => down_liq += level.weight,
            _ => {}
        }
    }

    if let Some(extremes) = ath_atl {
        if extremes.ath.price > current_price {
            up_liq += extremes.ath.weight;
        }
        if extremes.atl.price < current_price {
            down_liq += extremes.atl.weight;
        }
    }

    let direction = if up_liq > down_liq * HYSTERESIS {
        Direction::Up
    } else if down_liq > up_liq * HYSTERESIS {
        Direction::Down
    } else {
        Direction::Neutral
    };

    LiquidityDirectionReport { direction, up_liq, down_liq }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LiquidityKind;

    fn level(price: f64, level_type: LevelType, weight: f64) -> LiquidityLevel {
        LiquidityLevel {
            kind: LiquidityKind::StopCluster,
            price,
            level_type,
            source: "wick".to_string(),
            timestamp_ms: 0,
            weight,
        }
    }

    #[test]
    fn requires_ten_percent_edge_to_commit_a_direction() {
        let stops = vec![level(110.0, LevelType::BuyStops, 1.0)];
        let swings = vec![level(90.0, LevelType::SellStops, 0.95)];
        let report = detect_liquidity_direction(&stops, &swings, None, 100.0);
        assert_eq!(report.direction, Direction::Neutral);
    }

    #[test]
    fn clear_imbalance_wins() {
        let stops = vec![level(110.0, LevelType::BuyStops, 3.0)];
        let swings = vec![level(90.0, LevelType::SellStops, 0.5)];
        let report = detect_liquidity_direction(&stops, &swings, None, 100.0);
        assert_eq!(report.direction, Direction::Up);
    }
}
