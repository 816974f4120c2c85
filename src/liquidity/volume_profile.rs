//! Volume profile: where volume has actually traded, not just where price was.

use crate::models::Ohlcv;

const DEFAULT_NUM_BINS: usize = 50;
const VALUE_AREA_FRACTION: f64 = 0.70;
const POC_PROXIMITY_PCT: f64 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct VolumeProfile {
    pub poc: Option<f64>,
    pub poc_volume: f64,
    pub val: Option<f64>,
    pub vah: Option<f64>,
    pub total_volume: f64,
    /// Bucket lower-bound price -> volume accumulated in that bucket.
    pub profile: Vec<(f64, f64)>,
}

pub fn calculate_volume_profile(ohlcv: &Ohlcv, num_bins: usize) -> VolumeProfile {
    let num_bins = if num_bins == 0 { DEFAULT_NUM_BINS } else { num_bins };
    if ohlcv.len() < 10 {
        return VolumeProfile::default();
    }

    let price_min = ohlcv.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let price_max = ohlcv.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    if price_min >= price_max {
        return VolumeProfile::default();
    }

    let bin_width = (price_max - price_min) / num_bins as f64;
    let bin_edges: Vec<f64> = (0..=num_bins).map(|i| price_min + bin_width * i as f64).collect();
    let mut volume_at_price = vec![0.0_f64; num_bins];

    for bar in ohlcv {
        if bar.high <= bar.low {
            continue;
        }
        for i in 0..num_bins {
            let bin_low = bin_edges[i];
            let bin_high = bin_edges[i + 1];
            if bar.high >= bin_low && bar.low <= bin_high {
                let overlap_low = bar.low.max(bin_low);
                let overlap_high = bar.high.min(bin_high);
                let overlap_pct = (overlap_high - overlap_low) / (bar.high - bar.low);
                volume_at_price[i] += bar.volume * overlap_pct;
            }
        }
    }

    let total_volume: f64 = volume_at_price.iter().sum();
    let (poc_idx, poc_volume) = volume_at_price
        .iter()
        .enumerate()
        .fold((0usize, f64::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
    let poc = bin_edges[poc_idx];

    let mut ranked: Vec<usize> = (0..num_bins).collect();
    ranked.sort_by(|&a, &b| volume_at_price[b].partial_cmp(&volume_at_price[a]).unwrap());

    let target_volume = total_volume * VALUE_AREA_FRACTION;
    let mut accumulated = 0.0;
    let mut value_area_bins = Vec::new();
    for &i in &ranked {
        if accumulated >= target_volume {
            break;
        }
        value_area_bins.push(bin_edges[i]);
        accumulated += volume_at_price[i];
    }

    let val = value_area_bins.iter().cloned().fold(f64::MAX, f64::min);
    let vah = value_area_bins.iter().cloned().fold(f64::MIN, f64::max);

    VolumeProfile {
        poc: Some(poc),
        poc_volume,
        val: if value_area_bins.is_empty() { None } else { Some(val) },
        vah: if value_area_bins.is_empty() { None } else { Some(vah) },
        total_volume,
        profile: bin_edges[..num_bins].iter().cloned().zip(volume_at_price).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueAreaPosition {
    AboveVah,
    InValueArea,
    BelowVal,
    Unknown,
}

impl Default for ValueAreaPosition {
    fn default() -> Self {
        ValueAreaPosition::Unknown
    }
}

pub fn get_position_relative_to_value_area(current_price: f64, profile: &VolumeProfile) -> ValueAreaPosition {
    match (profile.val, profile.vah) {
        (Some(val), Some(vah)) => {
            if current_price > vah {
                ValueAreaPosition::AboveVah
            } else if current_price < val {
                ValueAreaPosition::BelowVal
            } else {
                ValueAreaPosition::InValueArea
            }
        }
        _ => ValueAreaPosition::Unknown,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PocRole {
    Magnet,
    Support,
    Resistance,
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct PocInfo {
    pub near_poc: bool,
    pub distance_pct: Option<f64>,
    pub acts_as: PocRole,
}

impl Default for PocInfo {
    fn default() -> Self {
        Self { near_poc: false, distance_pct: None, acts_as: PocRole::None }
    }
}

pub fn get_poc_significance(current_price: f64, profile: &VolumeProfile) -> PocInfo {
    let Some(poc) = profile.poc else {
        return PocInfo { near_poc: false, distance_pct: None, acts_as: PocRole::None };
    };
    if current_price == 0.0 {
        return PocInfo { near_poc: false, distance_pct: None, acts_as: PocRole::None };
    }

    let distance_pct = (current_price - poc).abs() / current_price * 100.0;
    let near_poc = distance_pct <= POC_PROXIMITY_PCT;

    let acts_as = if near_poc {
        PocRole::Magnet
    } else if current_price > poc {
        PocRole::Support
    } else {
        PocRole::Resistance
    };

    PocInfo { near_poc, distance_pct: Some(distance_pct), acts_as }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;

    fn candle(h: f64, l: f64, v: f64) -> Candle {
        Candle { open: (h + l) / 2.0, high: h, low: l, close: (h + l) / 2.0, volume: v, timestamp_ms: 0 }
    }

    #[test]
    fn poc_lands_in_the_heaviest_traded_bucket() {
        let mut ohlcv: Ohlcv = (0..12).map(|_| candle(101.0, 99.0, 1.0)).collect();
        for _ in 0..5 {
            ohlcv.push(candle(111.0, 109.0, 1000.0));
        }
        let profile = calculate_volume_profile(&ohlcv, 50);
        let poc = profile.poc.unwrap();
        assert!(poc > 105.0);
    }

    #[test]
    fn too_few_candles_yields_empty_profile() {
        let ohlcv: Ohlcv = (0..3).map(|_| candle(101.0, 99.0, 1.0)).collect();
        let profile = calculate_volume_profile(&ohlcv, 50);
        assert!(profile.poc.is_none());
    }
}
