//! LiquidityEngine: stop clusters, swing/ATH-ATL liquidity, sweeps, touches,
//! volume profile, and the swept-level tracker that ties them together
//! across ticks.
//!
//! Grounded in `modules/liquidity/{stop_clusters,swing_liquidity,ath_atl,
//! sweep_detector,touch_detector,swept_tracker,volume_profile,
//! liquidity_direction,liquidity_engine}.py`.

pub mod ath_atl;
pub mod direction;
pub mod stop_clusters;
pub mod swept_tracker;
pub mod swing_liquidity;
pub mod sweep;
pub mod touch;
pub mod volume_profile;

use crate::models::{Direction, LiquidityLevel, Ohlcv, SweptRecord};
use crate::structure::MarketStructure;
use ath_atl::AthAtl;
use direction::LiquidityDirectionReport;
use sweep::{BreakoutReport, HistoricalSweep, SweepReport};
use swept_tracker::SweptLevelsTracker;
use touch::TouchedLevel;
use volume_profile::{PocInfo, ValueAreaPosition, VolumeProfile};

const TOUCH_LOOKBACK: usize = 20;
const TOUCH_TOLERANCE_PCT: f64 = 0.2;
const RECENT_TOUCH_COOLDOWN_CANDLES: usize = 20;
const SWEPT_FILTER_TOLERANCE_PCT: f64 = 0.5;
const SWEEP_LOOKBACK: usize = 50;
const HISTORICAL_SWEEP_LOOKBACK_CANDLES: usize = 100;
const VOLUME_PROFILE_BINS: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct LiquidityReport {
    pub stop_clusters: Vec<LiquidityLevel>,
    pub swing_liquidity: Vec<LiquidityLevel>,
    pub ath_atl: Option<AthAtl>,
    pub sweep: SweepReport,
    pub historical_sweeps: Vec<HistoricalSweep>,
    pub touched_levels: Vec<TouchedLevel>,
    pub breakout_up: BreakoutReport,
    pub breakout_down: BreakoutReport,
    pub direction: LiquidityDirectionReport,
    pub volume_profile: VolumeProfile,
    pub va_position: ValueAreaPosition,
    pub poc_info: PocInfo,
    pub swept_levels: Vec<SweptRecord>,
}

/// Owns the swept-level tracker, the only stateful piece of this engine.
pub struct LiquidityEngine {
    swept_tracker: SweptLevelsTracker,
}

impl LiquidityEngine {
    pub fn new(swept_expiry_hours: f64) -> Self {
        Self {
            swept_tracker: SweptLevelsTracker::new(swept_expiry_hours),
        }
    }

    pub fn analyze(&mut self, ohlcv: &Ohlcv, structure: &MarketStructure, now_ms: i64) -> LiquidityReport {
        let mut stop_clusters = stop_clusters::detect_stop_clusters(ohlcv, now_ms, true);
        let mut swing_liq = swing_liquidity::detect_swing_liquidity(structure, now_ms, true);
        let ath_atl = ath_atl::detect_ath_atl_liquidity(ohlcv);

        let current_price = ohlcv.last().map(|c| c.close).unwrap_or(0.0);

        let stops_above: Vec<f64> = stop_clusters
            .iter()
            .filter(|c| c.level_type == crate::models::LevelType::BuyStops)
            .map(|c| c.price)
            .collect();
        let stops_below: Vec<f64> = stop_clusters
            .iter()
            .filter(|c| c.level_type == crate::models::LevelType::SellStops)
            .map(|c| c.price)
            .collect();

        let sweep_report = sweep::detect_sweep(ohlcv, SWEEP_LOOKBACK, &stops_above, &stops_below);
        if sweep_report.post_reversal {
            for hit in &sweep_report.swept_prices {
                self.swept_tracker.mark_as_swept(now_ms, hit.price, hit.direction, "sweep_with_reversal", None);
            }
        }

        let historical_sweeps = if ohlcv.len() >= 20 {
            sweep::detect_historical_sweeps(
                ohlcv,
                &structure.swings.highs,
                &structure.swings.lows,
                current_price,
                HISTORICAL_SWEEP_LOOKBACK_CANDLES,
            )
        } else {
            Vec::new()
        };
        for hs in &historical_sweeps {
            self.swept_tracker.mark_as_swept(
                now_ms,
                hs.price,
                hs.direction,
                "historical_sweep",
                Some(hs.candles_ago as u32),
            );
        }

        let touched_stops = touch::detect_recent_touches(ohlcv, &stop_clusters, TOUCH_LOOKBACK, TOUCH_TOLERANCE_PCT);
        let touched_swings = touch::detect_recent_touches(ohlcv, &swing_liq, TOUCH_LOOKBACK, TOUCH_TOLERANCE_PCT);

        for touch in touched_stops.touched.iter().chain(touched_swings.touched.iter()) {
            if touch.candles_ago < RECENT_TOUCH_COOLDOWN_CANDLES {
                let direction = match touch.level_type {
                    crate::models::LevelType::BuyStops => Direction::Up,
                    crate::models::LevelType::SellStops => Direction::Down,
                };
                self.swept_tracker.mark_as_swept(now_ms, touch.price, direction, "recent_touch", Some(touch.candles_ago as u32));
            }
        }

        stop_clusters = self.swept_tracker.filter_swept_levels(now_ms, stop_clusters, SWEPT_FILTER_TOLERANCE_PCT);
        swing_liq = self.swept_tracker.filter_swept_levels(now_ms, swing_liq, SWEPT_FILTER_TOLERANCE_PCT);

        let direction = direction::detect_liquidity_direction(&stop_clusters, &swing_liq, ath_atl.as_ref(), current_price);

        let nearest_up = stop_clusters
            .iter()
            .chain(swing_liq.iter())
            .filter(|l| l.level_type == crate::models::LevelType::BuyStops && l.price > current_price)
            .min_by(|a, b| a.price.partial_cmp(&b.price).unwrap())
            .map(|l| l.price);
        let nearest_down = stop_clusters
            .iter()
            .chain(swing_liq.iter())
            .filter(|l| l.level_type == crate::models::LevelType::SellStops && l.price < current_price)
            .max_by(|a, b| a.price.partial_cmp(&b.price).unwrap())
            .map(|l| l.price);

        let breakout_up = match (direction.direction, nearest_up) {
            (Direction::Up, Some(level)) => sweep::detect_breakout(ohlcv, level, Direction::Up, 3),
            _ => BreakoutReport::default(),
        };
        let breakout_down = match (direction.direction, nearest_down) {
            (Direction::Down, Some(level)) => sweep::detect_breakout(ohlcv, level, Direction::Down, 3),
            _ => BreakoutReport::default(),
        };

        let volume_profile = volume_profile::calculate_volume_profile(ohlcv, VOLUME_PROFILE_BINS);
        let va_position = volume_profile::get_position_relative_to_value_area(current_price, &volume_profile);
        let poc_info = volume_profile::get_poc_significance(current_price, &volume_profile);

        let swept_levels = self.swept_tracker.get_all_swept(now_ms);
        let mut touched_levels = touched_stops.touched;
        touched_levels.extend(touched_swings.touched);

        LiquidityReport {
            stop_clusters,
            swing_liquidity: swing_liq,
            ath_atl,
            sweep: sweep_report,
            historical_sweeps,
            touched_levels,
            breakout_up,
            breakout_down,
            direction,
            volume_profile,
            va_position,
            poc_info,
            swept_levels,
        }
    }
}

impl Default for LiquidityEngine {
    fn default() -> Self {
        Self::new(24.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;

    fn flat_candles(n: usize, price: f64) -> Ohlcv {
        (0..n)
            .map(|i| Candle {
                open: price,
                high: price + 1.0,
                low: price - 1.0,
                close: price,
                volume: 10.0,
                timestamp_ms: i as i64 * 60_000,
            })
            .collect()
    }

    #[test]
    fn analyze_on_flat_tape_yields_neutral_direction() {
        let ohlcv = flat_candles(60, 100.0);
        let structure = crate::structure::MarketStructureEngine::new().analyze(&ohlcv);
        let mut engine = LiquidityEngine::default();
        let report = engine.analyze(&ohlcv, &structure, 60 * 60_000);
        assert_eq!(report.direction.direction, Direction::Neutral);
    }

    #[test]
    fn swept_tracker_state_persists_across_calls() {
        let ohlcv = flat_candles(60, 100.0);
        let structure = crate::structure::MarketStructureEngine::new().analyze(&ohlcv);
        let mut engine = LiquidityEngine::new(24.0);
        engine.swept_tracker.mark_as_swept(0, 100.0, Direction::Down, "sweep", None);
        let report = engine.analyze(&ohlcv, &structure, 1000);
        assert_eq!(report.swept_levels.len(), 1);
    }
}
