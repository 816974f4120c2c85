//! Path cost: how much size stands between price and a move in each direction.
//!
//! Adds two enrichments over the distilled source's `compute_path_cost`: a
//! per-level contribution cap (5x the side average, so a single outsized
//! level can't dominate the integral) and a 0.7 multiplier on the thin side.

use crate::models::OrderBook;
use crate::svd::thin_zones::ThinZonesReport;
use crate::util::normalize_path_cost_on_atr;

const DEPTH_LEVELS: usize = 20;
const PER_LEVEL_CAP_MULT: f64 = 5.0;
const THIN_SIDE_DISCOUNT: f64 = 0.7;

#[derive(Debug, Clone, Copy, Default)]
pub struct PathCostReport {
    pub up: f64,
    pub down: f64,
}

pub fn compute_path_cost(book: &OrderBook, current_price: f64, thin: &ThinZonesReport, atr_pct: Option<f64>) -> PathCostReport {
    if current_price == 0.0 {
        return PathCostReport::default();
    }

    let asks: Vec<_> = book.asks.iter().take(DEPTH_LEVELS).collect();
    let bids: Vec<_> = book.bids.iter().take(DEPTH_LEVELS).collect();

    let avg_ask = if asks.is_empty() { 0.0 } else { asks.iter().map(|l| l.size).sum::<f64>() / asks.len() as f64 };
    let avg_bid = if bids.is_empty() { 0.0 } else { bids.iter().map(|l| l.size).sum::<f64>() / bids.len() as f64 };
    let ask_cap = avg_ask * PER_LEVEL_CAP_MULT;
    let bid_cap = avg_bid * PER_LEVEL_CAP_MULT;

    let mut cost_up = 0.0;
    for level in &asks {
        if level.price <= 0.0 {
            continue;
        }
        let dist = (level.price - current_price).max(0.0);
        let size = if ask_cap > 0.0 { level.size.min(ask_cap) } else { level.size };
        cost_up += size * (dist / current_price);
    }

    let mut cost_down = 0.0;
    for level in &bids {
        if level.price <= 0.0 {
            continue;
        }
        let dist = (current_price - level.price).max(0.0);
        let size = if bid_cap > 0.0 { level.size.min(bid_cap) } else { level.size };
        cost_down += size * (dist / current_price);
    }

    if thin.thin_above.is_some() {
        cost_up *= THIN_SIDE_DISCOUNT;
    }
    if thin.thin_below.is_some() {
        cost_down *= THIN_SIDE_DISCOUNT;
    }

    match atr_pct {
        Some(atr) => {
            let (up, down) = normalize_path_cost_on_atr(cost_up, cost_down, atr);
            PathCostReport { up, down }
        }
        None => PathCostReport { up: cost_up, down: cost_down },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookLevel;

    #[test]
    fn farther_levels_cost_more() {
        let book = OrderBook {
            bids: vec![],
            asks: vec![BookLevel { price: 101.0, size: 1.0 }, BookLevel { price: 110.0, size: 1.0 }],
            timestamp_ms: Some(0),
        };
        let thin = ThinZonesReport::default();
        let report = compute_path_cost(&book, 100.0, &thin, None);
        assert!(report.up > 0.0);
    }

    #[test]
    fn thin_side_is_discounted() {
        let book = OrderBook {
            bids: vec![],
            asks: vec![BookLevel { price: 110.0, size: 10.0 }],
            timestamp_ms: Some(0),
        };
        let thin_present = ThinZonesReport { thin_above: Some((110.0, 1.0)), thin_below: None };
        let thin_absent = ThinZonesReport::default();
        let discounted = compute_path_cost(&book, 100.0, &thin_present, None);
        let full = compute_path_cost(&book, 100.0, &thin_absent, None);
        assert!(discounted.up < full.up);
    }
}
