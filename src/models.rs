//! Core data model shared by every engine in the pipeline.
//!
//! Liquidity levels and alerts use a `kind` tag plus a small set of common
//! fields (tagged variant enums), rather than a trait-object interface.

use serde::{Deserialize, Serialize};

/// A single OHLCV candle. `timestamp_ms` is milliseconds since epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub timestamp_ms: i64,
}

/// Ordered ascending-by-timestamp OHLCV sequence.
pub type Ohlcv = Vec<Candle>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

/// `bids` descending by price, `asks` ascending by price.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub timestamp_ms: Option<i64>,
}

impl OrderBook {
    pub fn avg_bid(&self) -> f64 {
        mean(self.bids.iter().map(|l| l.size))
    }

    pub fn avg_ask(&self) -> f64 {
        mean(self.asks.iter().map(|l| l.size))
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.first().map(|l| l.price)
    }
}

fn mean(it: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = it.clone().count();
    if n == 0 {
        return 0.0;
    }
    it.sum::<f64>() / n as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Trade {
    pub price: f64,
    pub volume: f64,
    pub side: Side,
    pub timestamp_ms: i64,
}

/// A local price extremum with surrounding-window significance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
    pub timestamp_ms: i64,
    pub significance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelType {
    BuyStops,
    SellStops,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityKind {
    StopCluster,
    SwingLiquidity,
    AthAtl,
}

/// Invariant: `BuyStops` is only meaningful when `price >= current close`;
/// mirror for `SellStops`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityLevel {
    pub kind: LiquidityKind,
    pub price: f64,
    pub level_type: LevelType,
    pub source: String,
    pub timestamp_ms: i64,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Neutral
    }
}

/// A previously-swept liquidity level, tracked across ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweptRecord {
    pub price: f64,
    pub direction: Direction,
    pub reason: String,
    pub first_seen_ms: i64,
    pub last_seen_ms: i64,
    pub count: u32,
    pub candles_ago: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Manipulation,
    Execution,
    Distribution,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Discovery
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub entered_at_ms: i64,
    pub duration_secs: f64,
}

/// Running sum of signed trade volumes, with a capped history for slope
/// computation and divergence detection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CvdState {
    pub cumulative: f64,
    pub history: Vec<f64>,
    pub reset_anchor_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookSide {
    Bid,
    Ask,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpoofEvent {
    pub side: BookSide,
    pub price: f64,
    pub duration_ms: i64,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDirection {
    Buy,
    Sell,
    Wait,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Levels {
    pub entry_zone: Option<String>,
    pub targets: Vec<String>,
    pub invalidation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub main: String,
    pub alternative: String,
}

/// The pipeline's emitted output for a tick. WAIT is produced internally but
/// is not forwarded to any presentation layer (out of scope here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRecord {
    pub direction: SignalDirection,
    pub confidence: f64,
    pub explanation: String,
    pub scenario: Scenario,
    pub levels: Levels,
    pub conflicts: crate::decision::conflict::ConflictReport,
    pub trap: crate::trap::TrapReport,
    pub behavior: crate::behavior::BehaviorRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    PhaseChange,
    CvdIntentChange,
    CvdReversal,
    ExecutionPhase,
    StrongSignal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub timestamp_ms: i64,
    pub message: String,
    pub payload: serde_json::Value,
}
