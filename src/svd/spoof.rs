//! Spoof wall detection: a single-tick heuristic plus a cross-tick tracker
//! that confirms a wall by watching it disappear.
//!
//! The single-tick heuristic is grounded in `spoof_detector.py`. The
//! stateful confirmation tracker (remembering the previous wall, matching
//! its disappearance against time/price bounds, appending to a capped
//! deque) has no surviving reference implementation and is built from prose,
//! styled after the teacher's own stateful trackers (`SequenceTracker` /
//! `ReorderBuffer` in `edge/client.rs`, `DataSourceKillSwitch` in `main.rs`).

use crate::models::{BookSide, OrderBook, SpoofEvent};
use std::collections::VecDeque;

const PROXIMITY_PCT: f64 = 0.002;
const WALL_MULT: f64 = 4.0;
const TOP_LEVELS: usize = 10;
const CONFIRM_PRICE_MOVE_PCT: f64 = 0.0015;
const CONFIRM_MAX_LIFETIME_MS: i64 = 15_000;
const SPOOF_EVENTS_CAP: usize = 20;

#[derive(Debug, Clone, Copy, Default)]
pub struct SpoofWall {
    pub side: Option<BookSide>,
    pub price: Option<f64>,
    pub volume: Option<f64>,
    pub factor: f64,
}

pub fn detect_spoof_wall(book: &OrderBook, current_price: f64) -> SpoofWall {
    if current_price == 0.0 {
        return SpoofWall { factor: 1.0, ..Default::default() };
    }

    let asks: Vec<_> = book.asks.iter().take(TOP_LEVELS).collect();
    let bids: Vec<_> = book.bids.iter().take(TOP_LEVELS).collect();

    let avg_ask = if asks.is_empty() { 0.0 } else { asks.iter().map(|l| l.size).sum::<f64>() / asks.len() as f64 };
    let avg_bid = if bids.is_empty() { 0.0 } else { bids.iter().map(|l| l.size).sum::<f64>() / bids.len() as f64 };

    let mut best = SpoofWall { factor: 1.0, ..Default::default() };

    if avg_ask > 0.0 {
        for level in &asks {
            if level.price <= current_price * (1.0 + PROXIMITY_PCT) {
                let factor = level.size / avg_ask;
                if factor >= WALL_MULT && factor > best.factor {
                    best = SpoofWall { side: Some(BookSide::Ask), price: Some(level.price), volume: Some(level.size), factor };
                }
            }
        }
    }
    if avg_bid > 0.0 {
        for level in &bids {
            if level.price >= current_price * (1.0 - PROXIMITY_PCT) {
                let factor = level.size / avg_bid;
                if factor >= WALL_MULT && factor > best.factor {
                    best = SpoofWall { side: Some(BookSide::Bid), price: Some(level.price), volume: Some(level.size), factor };
                }
            }
        }
    }

    best
}

struct TrackedWall {
    side: BookSide,
    price: f64,
    ts_start: i64,
    ts_last: i64,
}

/// Watches the single-tick wall heuristic across ticks and confirms a spoof
/// once a wall vanishes within its time/price bounds.
pub struct SpoofTracker {
    last_wall: Option<TrackedWall>,
    events: VecDeque<SpoofEvent>,
}

impl SpoofTracker {
    pub fn new() -> Self {
        Self { last_wall: None, events: VecDeque::new() }
    }

    pub fn events(&self) -> &VecDeque<SpoofEvent> {
        &self.events
    }

    /// `current_wall` is the result of `detect_spoof_wall` for this tick.
    pub fn update(&mut self, current_wall: SpoofWall, current_price: f64, now_ms: i64) -> bool {
        let mut confirmed = false;

        match (&self.last_wall, current_wall.side, current_wall.price) {
            (Some(tracked), Some(side), Some(price)) if tracked.side == side && (tracked.price - price).abs() / price < PROXIMITY_PCT => {
                self.last_wall = Some(TrackedWall { side, price, ts_start: tracked.ts_start, ts_last: now_ms });
            }
            (Some(tracked), _, _) => {
                let lifetime_ms = tracked.ts_last - tracked.ts_start;
                let price_move = if tracked.price != 0.0 { (current_price - tracked.price).abs() / tracked.price } else { 1.0 };
                if lifetime_ms < CONFIRM_MAX_LIFETIME_MS && price_move < CONFIRM_PRICE_MOVE_PCT {
                    confirmed = true;
                    self.push_event(SpoofEvent { side: tracked.side, price: tracked.price, duration_ms: lifetime_ms, timestamp_ms: now_ms });
                }
                self.last_wall = current_wall.side.zip(current_wall.price).map(|(side, price)| TrackedWall { side, price, ts_start: now_ms, ts_last: now_ms });
            }
            (None, Some(side), Some(price)) => {
                self.last_wall = Some(TrackedWall { side, price, ts_start: now_ms, ts_last: now_ms });
            }
            (None, _, _) => {}
        }

        confirmed
    }

    fn push_event(&mut self, event: SpoofEvent) {
        self.events.push_back(event);
        while self.events.len() > SPOOF_EVENTS_CAP {
            self.events.pop_front();
        }
    }
}

impl Default for SpoofTracker {
    fn default() -> Self {
        Self::new()
    }
}
