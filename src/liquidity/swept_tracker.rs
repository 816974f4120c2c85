//! Tracks previously-swept liquidity levels so they aren't reused for the
//! same round-trip. Stateful across ticks, hence kept on `LiquidityEngine`
//! rather than rebuilt per call.

use crate::models::{Direction, LiquidityLevel, SweptRecord};

const DEDUP_PROXIMITY_PCT: f64 = 0.1;
const SAME_CYCLE_DEDUP_MS: i64 = 60_000;

pub struct SweptLevelsTracker {
    levels: Vec<SweptRecord>,
    expiry_ms: i64,
}

impl SweptLevelsTracker {
    pub fn new(expiry_hours: f64) -> Self {
        Self {
            levels: Vec::new(),
            expiry_ms: (expiry_hours * 3_600_000.0) as i64,
        }
    }

    pub fn mark_as_swept(&mut self, now_ms: i64, price: f64, direction: Direction, reason: &str, candles_ago: Option<u32>) {
        for level in &mut self.levels {
            if ((level.price - price) / price).abs() < DEDUP_PROXIMITY_PCT / 100.0 {
                let since_last = now_ms - level.last_seen_ms;
                if since_last < SAME_CYCLE_DEDUP_MS {
                    return;
                }
                level.last_seen_ms = now_ms;
                level.count += 1;
                if candles_ago.is_some() && level.candles_ago.is_none() {
                    level.candles_ago = candles_ago;
                }
                return;
            }
        }

        self.levels.push(SweptRecord {
            price,
            direction,
            reason: reason.to_string(),
            first_seen_ms: now_ms,
            last_seen_ms: now_ms,
            count: 1,
            candles_ago,
        });
    }

    pub fn is_swept(&mut self, now_ms: i64, price: f64, tolerance_pct: f64) -> bool {
        self.cleanup_expired(now_ms);
        self.levels.iter().any(|l| ((l.price - price) / price).abs() * 100.0 < tolerance_pct)
    }

    pub fn get_swept_info(&mut self, now_ms: i64, price: f64, tolerance_pct: f64) -> Option<&SweptRecord> {
        self.cleanup_expired(now_ms);
        self.levels.iter().find(|l| ((l.price - price) / price).abs() * 100.0 < tolerance_pct)
    }

    pub fn filter_swept_levels(&mut self, now_ms: i64, levels: Vec<LiquidityLevel>, tolerance_pct: f64) -> Vec<LiquidityLevel> {
        self.cleanup_expired(now_ms);
        levels
            .into_iter()
            .filter(|l| !self.is_swept(now_ms, l.price, tolerance_pct))
            .collect()
    }

    pub fn get_all_swept(&mut self, now_ms: i64) -> Vec<SweptRecord> {
        self.cleanup_expired(now_ms);
        self.levels.clone()
    }

    fn cleanup_expired(&mut self, now_ms: i64) {
        let expiry_ms = self.expiry_ms;
        self.levels.retain(|l| now_ms - l.last_seen_ms < expiry_ms);
    }

    pub fn reset(&mut self) {
        self.levels.clear();
    }
}

impl Default for SweptLevelsTracker {
    fn default() -> Self {
        Self::new(24.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_cycle_duplicate_does_not_increment_count() {
        let mut tracker = SweptLevelsTracker::new(24.0);
        tracker.mark_as_swept(0, 100.0, Direction::Down, "sweep", None);
        tracker.mark_as_swept(10_000, 100.05, Direction::Down, "sweep", None);
        let info = tracker.get_swept_info(10_000, 100.0, 0.5).unwrap();
        assert_eq!(info.count, 1);
    }

    #[test]
    fn new_cycle_after_60s_increments_count() {
        let mut tracker = SweptLevelsTracker::new(24.0);
        tracker.mark_as_swept(0, 100.0, Direction::Down, "sweep", None);
        tracker.mark_as_swept(61_000, 100.0, Direction::Down, "sweep", None);
        let info = tracker.get_swept_info(61_000, 100.0, 0.5).unwrap();
        assert_eq!(info.count, 2);
    }

    #[test]
    fn expired_levels_are_forgotten() {
        let mut tracker = SweptLevelsTracker::new(1.0);
        tracker.mark_as_swept(0, 100.0, Direction::Down, "sweep", None);
        assert!(!tracker.is_swept(3_600_001, 100.0, 0.5));
    }
}
