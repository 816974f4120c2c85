//! Groups trades into fixed-width time windows to read short-term dynamics.

use crate::models::{Side, Trade};
use std::collections::BTreeMap;

const BUCKET_SECONDS: i64 = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct BucketMetrics {
    pub delta: f64,
    pub buy_volume: f64,
    pub sell_volume: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TradeBucketsReport {
    pub bucket_count: usize,
    pub last_bucket: BucketMetrics,
    pub mean_velocity: f64,
    pub pos_streak: u32,
    pub neg_streak: u32,
}

pub fn bucket_trades(trades: &[Trade]) -> TradeBucketsReport {
    if trades.is_empty() {
        return TradeBucketsReport::default();
    }

    let mut buckets: BTreeMap<i64, Vec<Trade>> = BTreeMap::new();
    for &t in trades {
        let bucket_id = t.timestamp_ms.div_euclid(BUCKET_SECONDS * 1000);
        buckets.entry(bucket_id).or_default().push(t);
    }
    if buckets.is_empty() {
        return TradeBucketsReport::default();
    }

    let metrics: Vec<BucketMetrics> = buckets.values().map(|b| bucket_metrics(b)).collect();
    let last_bucket = *metrics.last().unwrap();
    let mean_velocity = metrics.iter().map(|m| m.velocity).sum::<f64>() / metrics.len() as f64;

    let mut pos_streak = 0;
    let mut neg_streak = 0;
    for m in metrics.iter().rev() {
        if m.delta > 0.0 {
            if neg_streak > 0 {
                break;
            }
            pos_streak += 1;
        } else if m.delta < 0.0 {
            if pos_streak > 0 {
                break;
            }
            neg_streak += 1;
        } else {
            break;
        }
    }

    TradeBucketsReport { bucket_count: metrics.len(), last_bucket, mean_velocity, pos_streak, neg_streak }
}

fn bucket_metrics(trades: &[Trade]) -> BucketMetrics {
    let mut buy = 0.0;
    let mut sell = 0.0;
    for t in trades {
        match t.side {
            Side::Buy => buy += t.volume,
            Side::Sell => sell += t.volume,
        }
    }
    let velocity = trades.len() as f64 / BUCKET_SECONDS as f64;
    BucketMetrics { delta: buy - sell, buy_volume: buy, sell_volume: sell, velocity }
}
