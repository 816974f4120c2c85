//! Thin zones: gaps in the book near price where depth thins out.

use crate::models::OrderBook;

const TOP_LEVELS: usize = 20;
const GAP_FACTOR: f64 = 0.3;

#[derive(Debug, Clone, Copy, Default)]
pub struct ThinZonesReport {
    pub thin_above: Option<(f64, f64)>,
    pub thin_below: Option<(f64, f64)>,
}

pub fn detect_thin_zones(book: &OrderBook) -> ThinZonesReport {
    let bids: Vec<_> = book.bids.iter().take(TOP_LEVELS).collect();
    let asks: Vec<_> = book.asks.iter().take(TOP_LEVELS).collect();

    let avg_bid = if bids.is_empty() { 0.0 } else { bids.iter().map(|l| l.size).sum::<f64>() / bids.len() as f64 };
    let avg_ask = if asks.is_empty() { 0.0 } else { asks.iter().map(|l| l.size).sum::<f64>() / asks.len() as f64 };

    let thin_above = if avg_ask > 0.0 {
        asks.iter().find(|l| l.size < avg_ask * GAP_FACTOR).map(|l| (l.price, l.size))
    } else {
        None
    };
    let thin_below = if avg_bid > 0.0 {
        bids.iter().find(|l| l.size < avg_bid * GAP_FACTOR).map(|l| (l.price, l.size))
    } else {
        None
    };

    ThinZonesReport { thin_above, thin_below }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookLevel;

    #[test]
    fn finds_first_ask_below_gap_factor() {
        let book = OrderBook {
            bids: vec![],
            asks: vec![BookLevel { price: 101.0, size: 10.0 }, BookLevel { price: 102.0, size: 1.0 }],
            timestamp_ms: Some(0),
        };
        let report = detect_thin_zones(&book);
        assert_eq!(report.thin_above, Some((102.0, 1.0)));
    }
}
