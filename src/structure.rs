//! Market structure: swings, trend, range, fair-value gaps, order blocks.

use crate::models::{Candle, Ohlcv, SwingPoint};
use serde::{Deserialize, Serialize};

const DEFAULT_LOOKBACK: usize = 2;
const VOLUME_SIGNIFICANCE_THRESHOLD: f64 = 1.2;
const RANGE_SIGNIFICANCE_THRESHOLD: f64 = 1.5;
const RANGE_VARIATION_THRESHOLD: f64 = 0.015;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Swings {
    pub highs: Vec<SwingPoint>,
    pub lows: Vec<SwingPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Range,
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeInfo {
    pub in_range: bool,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairValueGap {
    pub index: usize,
    pub gap_type: GapType,
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBlock {
    pub index: usize,
    pub block_type: GapType,
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketStructure {
    pub trend: Trend,
    pub swings: Swings,
    pub range: RangeInfo,
    pub fvg: Vec<FairValueGap>,
    pub orderblocks: Vec<OrderBlock>,
}

impl Default for Trend {
    fn default() -> Self {
        Trend::Unknown
    }
}

pub struct MarketStructureEngine {
    lookback: usize,
}

impl MarketStructureEngine {
    pub fn new() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
        }
    }

    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    pub fn analyze(&self, ohlcv: &Ohlcv) -> MarketStructure {
        let swings = self.detect_swings(ohlcv);
        let trend = detect_trend(&swings);
        let range = detect_range(&swings);
        let fvg = detect_fvg(ohlcv);
        let orderblocks = detect_orderblocks(ohlcv);

        MarketStructure {
            trend,
            swings,
            range,
            fvg,
            orderblocks,
        }
    }

    fn detect_swings(&self, ohlcv: &Ohlcv) -> Swings {
        let lookback = self.lookback;
        let mut highs = Vec::new();
        let mut lows = Vec::new();

        if ohlcv.len() < lookback * 2 + 1 {
            return Swings { highs, lows };
        }

        let avg_volume = mean(ohlcv.iter().map(|c| c.volume));
        let avg_range = mean(ohlcv.iter().map(|c| c.high - c.low));

        for i in lookback..(ohlcv.len() - lookback) {
            let bar = ohlcv[i];

            let is_swing_high = (1..=lookback)
                .all(|offset| bar.high > ohlcv[i - offset].high && bar.high > ohlcv[i + offset].high);
            if is_swing_high {
                if let Some(swing) = self.score_swing(i, bar, bar.high, avg_volume, avg_range) {
                    highs.push(swing);
                }
            }

            let is_swing_low = (1..=lookback)
                .all(|offset| bar.low < ohlcv[i - offset].low && bar.low < ohlcv[i + offset].low);
            if is_swing_low {
                if let Some(swing) = self.score_swing(i, bar, bar.low, avg_volume, avg_range) {
                    lows.push(swing);
                }
            }
        }

        Swings { highs, lows }
    }

    fn score_swing(
        &self,
        index: usize,
        bar: Candle,
        price: f64,
        avg_volume: f64,
        avg_range: f64,
    ) -> Option<SwingPoint> {
        let volume_significance = if avg_volume > 0.0 {
            bar.volume / avg_volume
        } else {
            1.0
        };
        let candle_range = bar.high - bar.low;
        let range_significance = if avg_range > 0.0 {
            candle_range / avg_range
        } else {
            1.0
        };

        if volume_significance < VOLUME_SIGNIFICANCE_THRESHOLD
            && range_significance < RANGE_SIGNIFICANCE_THRESHOLD
        {
            return None;
        }

        Some(SwingPoint {
            index,
            price,
            timestamp_ms: bar.timestamp_ms,
            significance: (volume_significance + range_significance) / 2.0,
        })
    }
}

impl Default for MarketStructureEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_trend(swings: &Swings) -> Trend {
    if swings.highs.len() < 2 || swings.lows.len() < 2 {
        return Trend::Unknown;
    }

    let hh = swings.highs[swings.highs.len() - 1].price > swings.highs[swings.highs.len() - 2].price;
    let hl = swings.lows[swings.lows.len() - 1].price > swings.lows[swings.lows.len() - 2].price;
    let lh = swings.highs[swings.highs.len() - 1].price < swings.highs[swings.highs.len() - 2].price;
    let ll = swings.lows[swings.lows.len() - 1].price < swings.lows[swings.lows.len() - 2].price;

    if hh && hl {
        Trend::Bullish
    } else if lh && ll {
        Trend::Bearish
    } else {
        Trend::Range
    }
}

fn detect_range(swings: &Swings) -> RangeInfo {
    if swings.highs.len() < 2 || swings.lows.len() < 2 {
        return RangeInfo::default();
    }

    let hi1 = swings.highs[swings.highs.len() - 1].price;
    let hi2 = swings.highs[swings.highs.len() - 2].price;
    let lo1 = swings.lows[swings.lows.len() - 1].price;
    let lo2 = swings.lows[swings.lows.len() - 2].price;

    let top_variation = if hi2 != 0.0 { (hi1 - hi2).abs() / hi2 } else { 0.0 };
    let bottom_variation = if lo2 != 0.0 { (lo1 - lo2).abs() / lo2 } else { 0.0 };

    if top_variation < RANGE_VARIATION_THRESHOLD && bottom_variation < RANGE_VARIATION_THRESHOLD {
        RangeInfo {
            in_range: true,
            top: Some(hi1.max(hi2)),
            bottom: Some(lo1.min(lo2)),
        }
    } else {
        RangeInfo::default()
    }
}

fn detect_fvg(ohlcv: &Ohlcv) -> Vec<FairValueGap> {
    let mut gaps = Vec::new();
    if ohlcv.len() < 3 {
        return gaps;
    }
    for i in 1..(ohlcv.len() - 1) {
        let prev = ohlcv[i - 1];
        let next = ohlcv[i + 1];

        if prev.high < next.low {
            gaps.push(FairValueGap {
                index: i,
                gap_type: GapType::Bullish,
                low: prev.high,
                high: next.low,
            });
        }
        if prev.low > next.high {
            gaps.push(FairValueGap {
                index: i,
                gap_type: GapType::Bearish,
                low: next.high,
                high: prev.low,
            });
        }
    }
    gaps
}

fn detect_orderblocks(ohlcv: &Ohlcv) -> Vec<OrderBlock> {
    let mut blocks = Vec::new();
    if ohlcv.len() < 7 {
        return blocks;
    }
    for i in 3..(ohlcv.len() - 3) {
        let bar = ohlcv[i];
        let next = ohlcv[i + 1];

        if bar.close < bar.open && next.close > next.open {
            blocks.push(OrderBlock {
                index: i,
                block_type: GapType::Bullish,
                low: bar.low,
                high: bar.high,
            });
        }
        if bar.close > bar.open && next.close < next.open {
            blocks.push(OrderBlock {
                index: i,
                block_type: GapType::Bearish,
                low: bar.low,
                high: bar.high,
            });
        }
    }
    blocks
}

fn mean(it: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = it.clone().count();
    if n == 0 {
        return 0.0;
    }
    it.sum::<f64>() / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(ts: i64, o: f64, h: f64, l: f64, c: f64, v: f64) -> Candle {
        Candle {
            open: o,
            high: h,
            low: l,
            close: c,
            volume: v,
            timestamp_ms: ts,
        }
    }

    #[test]
    fn swing_high_strictly_exceeds_its_window() {
        let ohlcv: Ohlcv = vec![
            candle(0, 100.0, 101.0, 99.0, 100.0, 30.0),
            candle(1, 100.0, 102.0, 99.0, 100.0, 30.0),
            candle(2, 100.0, 110.0, 99.0, 100.0, 100.0),
            candle(3, 100.0, 103.0, 99.0, 100.0, 30.0),
            candle(4, 100.0, 102.0, 99.0, 100.0, 30.0),
        ];
        let engine = MarketStructureEngine::new();
        let swings = engine.detect_swings(&ohlcv);
        assert_eq!(swings.highs.len(), 1);
        let swing = swings.highs[0];
        assert_eq!(swing.index, 2);
        for (j, bar) in ohlcv.iter().enumerate() {
            if j == 2 {
                continue;
            }
            assert!(swing.price > bar.high);
        }
    }

    #[test]
    fn bullish_fvg_detected_on_upward_gap() {
        let ohlcv: Ohlcv = vec![
            candle(0, 100.0, 101.0, 99.0, 100.0, 10.0),
            candle(1, 101.0, 102.0, 100.5, 101.5, 10.0),
            candle(2, 105.0, 106.0, 104.0, 105.0, 10.0),
        ];
        let gaps = detect_fvg(&ohlcv);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].gap_type, GapType::Bullish);
    }

    #[test]
    fn range_requires_two_highs_and_lows() {
        let swings = Swings::default();
        assert!(!detect_range(&swings).in_range);
    }
}
