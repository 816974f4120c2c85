//! Absorption: market orders hitting size without moving price.

use crate::models::{BookSide, OrderBook, Trade};
use crate::util::get_absorption_threshold;

const MIN_TRADES: usize = 5;
const BIG_TRADES_WINDOW: usize = 10;
const ABSORPTION_VOLUME_MULT: f64 = 4.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct AbsorptionReport {
    pub absorbing: bool,
    pub side: Option<BookSide>,
}

/// `side` mirrors the distilled source exactly: volume exceeding
/// `ABSORPTION_VOLUME_MULT * avg_ask` is reported on the sell side (size
/// hitting ask-side depth), and `avg_bid` on the buy side.
pub fn detect_absorption(trades: &[Trade], book: &OrderBook, atr_pct: Option<f64>) -> AbsorptionReport {
    if trades.len() < MIN_TRADES {
        return AbsorptionReport::default();
    }

    let last_price = trades[trades.len() - 1].price;
    let prev_price = trades[trades.len() - MIN_TRADES].price;
    if last_price == 0.0 || prev_price == 0.0 {
        return AbsorptionReport::default();
    }

    let price_change = (last_price - prev_price).abs() / prev_price;
    let threshold = match atr_pct {
        Some(atr) => get_absorption_threshold(atr, 0.05) / 100.0,
        None => 0.0005,
    };

    let avg_bid = book.avg_bid();
    let avg_ask = book.avg_ask();
    if avg_bid == 0.0 || avg_ask == 0.0 {
        return AbsorptionReport::default();
    }

    let big_trades: f64 = trades[trades.len() - BIG_TRADES_WINDOW.min(trades.len())..]
        .iter()
        .map(|t| t.volume)
        .sum();

    if price_change < threshold {
        if big_trades > avg_ask * ABSORPTION_VOLUME_MULT {
            return AbsorptionReport { absorbing: true, side: Some(BookSide::Ask) };
        }
        if big_trades > avg_bid * ABSORPTION_VOLUME_MULT {
            return AbsorptionReport { absorbing: true, side: Some(BookSide::Bid) };
        }
    }

    AbsorptionReport::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookLevel, Side};

    fn trade(price: f64, vol: f64) -> Trade {
        Trade { price, volume: vol, side: Side::Buy, timestamp_ms: 0 }
    }

    #[test]
    fn heavy_volume_with_flat_price_flags_absorption() {
        let trades: Vec<Trade> = (0..10).map(|_| trade(100.0, 50.0)).collect();
        let book = OrderBook {
            bids: vec![BookLevel { price: 99.0, size: 10.0 }],
            asks: vec![BookLevel { price: 101.0, size: 10.0 }],
            timestamp_ms: Some(0),
        };
        let report = detect_absorption(&trades, &book, None);
        assert!(report.absorbing);
    }

    #[test]
    fn too_few_trades_never_absorbs() {
        let trades = vec![trade(100.0, 1.0)];
        let book = OrderBook::default();
        assert!(!detect_absorption(&trades, &book, None).absorbing);
    }
}
