//! Inbound data feed abstraction.
//!
//! Grounded in the EXTERNAL INTERFACES table: `FetchOHLCV`,
//! `GetOrderBookSnapshot`, `GetTradesSnapshot`, `FetchHTFCandles`, modeled as
//! an `async_trait` `FeedSource` (the same shape `scrapers::dome_websocket`
//! and the other scraper modules use for exchange adapters), plus a
//! deterministic in-memory fixture for local running and tests — no live
//! exchange connectivity is implemented here.

use crate::models::{BookLevel, Candle, OrderBook, Side, Trade};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Returns the most recent `limit` candles plus the wall-clock fetch time.
    async fn fetch_ohlcv(&self, timeframe: &str, limit: usize) -> anyhow::Result<(Vec<Candle>, i64)>;

    /// Higher-timeframe candles, used for the optional `HtfContext` input.
    async fn fetch_htf_candles(&self, timeframe: &str, limit: usize) -> anyhow::Result<Vec<Candle>>;

    async fn get_orderbook_snapshot(&self) -> Option<OrderBook>;

    /// Copy of the bounded trades buffer, oldest first.
    async fn get_trades_snapshot(&self) -> Vec<Trade>;
}

/// Reconnect loop with a fixed backoff sequence rather than pure doubling.
/// Grounded in `scrapers::dome_websocket::DomeWebSocketClient::run`'s
/// connect/retry loop shape.
pub async fn run_with_backoff<F, Fut>(label: &'static str, backoff_secs: &[u64], shutdown: Arc<AtomicBool>, mut connect_and_stream: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut attempt = 0usize;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!(feed = label, "subscriber stopping on shutdown signal");
            return;
        }

        match connect_and_stream().await {
            Ok(()) => {
                info!(feed = label, "subscriber stream ended gracefully");
                attempt = 0;
            }
            Err(e) => {
                let idx = attempt.min(backoff_secs.len().saturating_sub(1));
                let delay = backoff_secs.get(idx).copied().unwrap_or(30);
                warn!(feed = label, error = %e, delay_secs = delay, "subscriber error, reconnecting");
                tokio::time::sleep(Duration::from_secs(delay)).await;
                attempt = (attempt + 1).min(backoff_secs.len().saturating_sub(1));
            }
        }
    }
}

/// Deterministic synthetic feed: a sine-plus-drift price path, a symmetric
/// order book around the last close, and alternating buy/sell trades. Same
/// series every run given the same construction parameters — used by the
/// supervisor when no live adapter is configured, and by integration tests.
pub struct FixtureFeed {
    base_price: f64,
    interval_ms: i64,
    candles: Vec<Candle>,
    orderbook: ArcSwapOption<OrderBook>,
    trades: Mutex<VecDeque<Trade>>,
    trades_cap: usize,
    tick: AtomicI64,
}

impl FixtureFeed {
    pub fn new(base_price: f64, candle_count: usize, interval_ms: i64, trades_cap: usize) -> Arc<Self> {
        let candles = generate_candles(base_price, candle_count, interval_ms, 0);
        let last_close = candles.last().map(|c| c.close).unwrap_or(base_price);

        let feed = Arc::new(Self {
            base_price,
            interval_ms,
            candles,
            orderbook: ArcSwapOption::from(Some(Arc::new(synthetic_orderbook(last_close, 0)))),
            trades: Mutex::new(VecDeque::new()),
            trades_cap,
            tick: AtomicI64::new(0),
        });

        for i in 0..trades_cap.min(200) {
            feed.trades.lock().push_back(synthetic_trade(last_close, i as i64, interval_ms));
        }

        feed
    }

    /// Advances the fixture by one step: a fresh order book and one new
    /// trade. Intended to be driven by a periodic task standing in for a
    /// WebSocket subscriber.
    pub fn advance(&self) {
        let step = self.tick.fetch_add(1, Ordering::Relaxed) + 1;
        let price = self.price_at(self.candles.len() as i64 + step);
        self.orderbook.store(Some(Arc::new(synthetic_orderbook(price, step))));

        let mut trades = self.trades.lock();
        trades.push_back(synthetic_trade(price, step, self.interval_ms));
        while trades.len() > self.trades_cap {
            trades.pop_front();
        }
    }

    fn price_at(&self, index: i64) -> f64 {
        price_path(self.base_price, index)
    }
}

#[async_trait]
impl FeedSource for FixtureFeed {
    async fn fetch_ohlcv(&self, _timeframe: &str, limit: usize) -> anyhow::Result<(Vec<Candle>, i64)> {
        let start = self.candles.len().saturating_sub(limit);
        let fetch_ts = self.candles.last().map(|c| c.timestamp_ms).unwrap_or(0);
        Ok((self.candles[start..].to_vec(), fetch_ts))
    }

    async fn fetch_htf_candles(&self, timeframe: &str, limit: usize) -> anyhow::Result<Vec<Candle>> {
        let factor = htf_aggregation_factor(timeframe);
        let candles = generate_candles(self.base_price, limit, self.interval_ms * factor, 0);
        Ok(candles)
    }

    async fn get_orderbook_snapshot(&self) -> Option<OrderBook> {
        self.orderbook.load_full().map(|arc| (*arc).clone())
    }

    async fn get_trades_snapshot(&self) -> Vec<Trade> {
        self.trades.lock().iter().copied().collect()
    }
}

fn htf_aggregation_factor(timeframe: &str) -> i64 {
    match timeframe {
        "1h" => 60,
        "4h" => 240,
        "1d" => 1440,
        _ => 60,
    }
}

fn price_path(base_price: f64, index: i64) -> f64 {
    let i = index as f64;
    base_price + base_price * 0.01 * (i * 0.15).sin() + i * (base_price * 0.00002)
}

fn generate_candles(base_price: f64, count: usize, interval_ms: i64, start_index: i64) -> Vec<Candle> {
    (0..count)
        .map(|n| {
            let index = start_index + n as i64;
            let close = price_path(base_price, index);
            let open = price_path(base_price, index - 1);
            let high = open.max(close) * 1.0015;
            let low = open.min(close) * 0.9985;
            let volume = base_price.max(1.0) * (1.2 + 0.4 * (index as f64 * 0.3).sin());
            Candle { open, high, low, close, volume, timestamp_ms: index * interval_ms }
        })
        .collect()
}

fn synthetic_orderbook(mid: f64, step: i64) -> OrderBook {
    let spread = mid * 0.0005;
    let depth = 10;
    let bids = (0..depth)
        .map(|i| BookLevel { price: mid - spread - mid * 0.0002 * i as f64, size: 2.0 + (i as f64 + step as f64 * 0.1).cos().abs() })
        .collect();
    let asks = (0..depth)
        .map(|i| BookLevel { price: mid + spread + mid * 0.0002 * i as f64, size: 2.0 + (i as f64 + step as f64 * 0.1).sin().abs() })
        .collect();
    OrderBook { bids, asks, timestamp_ms: Some(step) }
}

fn synthetic_trade(mid: f64, step: i64, interval_ms: i64) -> Trade {
    let side = if step % 2 == 0 { Side::Buy } else { Side::Sell };
    Trade { price: mid, volume: 0.5 + (step as f64 * 0.2).abs().fract(), side, timestamp_ms: step * interval_ms.max(1) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_feed_produces_requested_candle_count() {
        let feed = FixtureFeed::new(100.0, 60, 60_000, 100);
        let (candles, _fetch_ts) = feed.fetch_ohlcv("1m", 30).await.unwrap();
        assert_eq!(candles.len(), 30);
    }

    #[tokio::test]
    async fn fixture_feed_is_deterministic_across_instances() {
        let a = FixtureFeed::new(100.0, 20, 60_000, 50);
        let b = FixtureFeed::new(100.0, 20, 60_000, 50);
        let (ca, _) = a.fetch_ohlcv("1m", 20).await.unwrap();
        let (cb, _) = b.fetch_ohlcv("1m", 20).await.unwrap();
        assert_eq!(ca.iter().map(|c| c.close).collect::<Vec<_>>(), cb.iter().map(|c| c.close).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn advance_bounds_trades_at_capacity() {
        let feed = FixtureFeed::new(100.0, 10, 60_000, 5);
        for _ in 0..20 {
            feed.advance();
        }
        assert_eq!(feed.get_trades_snapshot().await.len(), 5);
    }

    #[tokio::test]
    async fn backoff_stops_immediately_on_shutdown() {
        let shutdown = Arc::new(AtomicBool::new(true));
        run_with_backoff("test", &[0], shutdown, || async { Ok(()) }).await;
    }
}
