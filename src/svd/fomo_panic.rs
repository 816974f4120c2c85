//! FOMO (aggressive buying chase) and panic (aggressive selling chase).

use crate::models::Trade;
use crate::svd::buckets::TradeBucketsReport;

const STRONG_PRICE_MOVE_PCT: f64 = 0.25;

#[derive(Debug, Clone, Copy, Default)]
pub struct FomoPanicReport {
    pub fomo: bool,
    pub strong_fomo: bool,
    pub panic: bool,
    pub strong_panic: bool,
}

pub fn detect_fomo_panic(buckets: &TradeBucketsReport, trades: &[Trade]) -> FomoPanicReport {
    let last = buckets.last_bucket;
    let mean_velocity = buckets.mean_velocity;
    let inter_trade_move = last_inter_trade_move_pct(trades);

    let fomo_velocity_gate = last.velocity > (mean_velocity * 1.1).max(5.0);
    let fomo = (last.delta > 0.0 || buckets.pos_streak >= 2) && fomo_velocity_gate;
    let strong_fomo = fomo
        && buckets.pos_streak >= 3
        && (last.velocity > (mean_velocity * 1.5).max(8.0) || inter_trade_move > STRONG_PRICE_MOVE_PCT);

    let panic_velocity_gate = fomo_velocity_gate;
    let panic = (last.delta < 0.0 || buckets.neg_streak >= 2) && panic_velocity_gate;
    let strong_panic = panic
        && buckets.neg_streak >= 3
        && (last.velocity > (mean_velocity * 1.5).max(8.0) || inter_trade_move > STRONG_PRICE_MOVE_PCT);

    FomoPanicReport { fomo, strong_fomo, panic, strong_panic }
}

fn last_inter_trade_move_pct(trades: &[Trade]) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }
    let prev = trades[trades.len() - 2].price;
    let last = trades[trades.len() - 1].price;
    if prev == 0.0 {
        return 0.0;
    }
    (last - prev).abs() / prev * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;

    #[test]
    fn velocity_spike_with_buy_delta_triggers_fomo() {
        let buckets = TradeBucketsReport {
            bucket_count: 3,
            last_bucket: crate::svd::buckets::BucketMetrics { delta: 100.0, buy_volume: 100.0, sell_volume: 0.0, velocity: 20.0 },
            mean_velocity: 5.0,
            pos_streak: 2,
            neg_streak: 0,
        };
        let trades = vec![
            Trade { price: 100.0, volume: 1.0, side: Side::Buy, timestamp_ms: 0 },
            Trade { price: 100.1, volume: 1.0, side: Side::Buy, timestamp_ms: 1 },
        ];
        let report = detect_fomo_panic(&buckets, &trades);
        assert!(report.fomo);
    }
}
