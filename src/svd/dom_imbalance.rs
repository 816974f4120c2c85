//! Order-book imbalance over the top N levels.

use crate::models::{BookSide, OrderBook};

const TOP_LEVELS: usize = 5;
const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub struct DomImbalanceReport {
    pub bid_vol: f64,
    pub ask_vol: f64,
    pub imbalance: f64,
    pub side: Option<BookSide>,
}

impl Default for DomImbalanceReport {
    fn default() -> Self {
        Self { bid_vol: 0.0, ask_vol: 0.0, imbalance: 1.0, side: None }
    }
}

pub fn compute_orderbook_imbalance(book: &OrderBook) -> DomImbalanceReport {
    let bid_vol: f64 = book.bids.iter().take(TOP_LEVELS).map(|l| l.size).sum();
    let ask_vol: f64 = book.asks.iter().take(TOP_LEVELS).map(|l| l.size).sum();

    if bid_vol == 0.0 && ask_vol == 0.0 {
        return DomImbalanceReport::default();
    }

    let imbalance = bid_vol / ask_vol.max(EPSILON);
    let side = if imbalance > 1.2 {
        Some(BookSide::Bid)
    } else if imbalance < 0.8 {
        Some(BookSide::Ask)
    } else {
        None
    };

    DomImbalanceReport { bid_vol, ask_vol, imbalance, side }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookLevel;

    #[test]
    fn heavy_bid_side_reports_bid() {
        let book = OrderBook {
            bids: vec![BookLevel { price: 99.0, size: 10.0 }],
            asks: vec![BookLevel { price: 101.0, size: 5.0 }],
            timestamp_ms: Some(0),
        };
        let report = compute_orderbook_imbalance(&book);
        assert_eq!(report.side, Some(BookSide::Bid));
    }

    #[test]
    fn balanced_book_is_neutral() {
        let book = OrderBook {
            bids: vec![BookLevel { price: 99.0, size: 10.0 }],
            asks: vec![BookLevel { price: 101.0, size: 10.0 }],
            timestamp_ms: Some(0),
        };
        assert!(compute_orderbook_imbalance(&book).side.is_none());
    }
}
