//! Cumulative Volume Delta: the running signed-volume scalar and its trend.

use crate::models::{CvdState, Side, SwingPoint, Trade};

const HISTORY_CAP: usize = 100;
const SLOPE_WINDOW: usize = 20;
const DIVERGENCE_PRICE_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct CvdReport {
    pub cvd: f64,
    pub cvd_change: f64,
    pub cvd_slope: f64,
    pub divergence: bool,
}

pub struct CvdCalculator {
    state: CvdState,
}

impl CvdCalculator {
    pub fn new() -> Self {
        Self { state: CvdState::default() }
    }

    pub fn state(&self) -> &CvdState {
        &self.state
    }

    pub fn calculate_from_trades(&mut self, trades: &[Trade]) -> CvdReport {
        if trades.len() < 2 {
            return CvdReport { cvd: self.state.cumulative, ..CvdReport::default() };
        }

        let initial_cvd = self.state.cumulative;
        for t in trades {
            match t.side {
                Side::Buy => self.state.cumulative += t.volume,
                Side::Sell => self.state.cumulative -= t.volume,
            }
        }
        let cvd_change = self.state.cumulative - initial_cvd;

        self.state.history.push(self.state.cumulative);
        if self.state.history.len() > HISTORY_CAP {
            self.state.history.remove(0);
        }

        let window_start = self.state.history.len().saturating_sub(SLOPE_WINDOW);
        let cvd_slope = linear_regression_slope(&self.state.history[window_start..]);
        let divergence = self.detect_divergence(trades);

        CvdReport { cvd: self.state.cumulative, cvd_change, cvd_slope, divergence }
    }

    /// Resets the running CVD to zero if price has broken the most recent
    /// retained swing since the last reset.
    pub fn maybe_reset_on_swing(&mut self, current_price: f64, highs: &[SwingPoint], lows: &[SwingPoint]) {
        let Some(last_reset) = self.state.reset_anchor_price else {
            self.state.reset_anchor_price = Some(current_price);
            return;
        };
        let _ = last_reset;
        let broke_high = highs.last().map(|h| current_price > h.price).unwrap_or(false);
        let broke_low = lows.last().map(|l| current_price < l.price).unwrap_or(false);
        if broke_high || broke_low {
            self.state.cumulative = 0.0;
            self.state.reset_anchor_price = Some(current_price);
        }
    }

    fn detect_divergence(&self, trades: &[Trade]) -> bool {
        if self.state.history.len() < SLOPE_WINDOW || trades.len() < DIVERGENCE_PRICE_WINDOW {
            return false;
        }

        let recent_cvd = &self.state.history[self.state.history.len() - SLOPE_WINDOW..];
        let recent_prices: Vec<f64> = trades[trades.len() - DIVERGENCE_PRICE_WINDOW..]
            .iter()
            .map(|t| t.price)
            .collect();
        if recent_prices.len() < 5 {
            return false;
        }

        let price_trend_up = half_split_trend(&recent_prices);
        let cvd_trend_up = half_split_trend(recent_cvd);
        price_trend_up != cvd_trend_up
    }

    pub fn reset(&mut self) {
        self.state = CvdState::default();
    }
}

impl Default for CvdCalculator {
    fn default() -> Self {
        Self::new()
    }
}

fn half_split_trend(values: &[f64]) -> bool {
    let mid = values.len() / 2;
    let first_half = mean(&values[..mid]);
    let second_half = mean(&values[mid..]);
    second_half > first_half
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn linear_regression_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
