//! Time-decay weighting shared by the liquidity and SVD engines.

/// Half-life used for liquidity-level decay (24h), in seconds.
pub const DEFAULT_HALF_LIFE_SECONDS: f64 = 86_400.0;

/// Weight in `[0, 1]` for a level whose age is `age_seconds`, decaying by half
/// every `half_life_seconds`. A `None` or non-positive timestamp is treated as
/// moderately stale (0.5); a negative age (clock skew, future timestamp) is
/// treated as fresh (1.0).
pub fn time_decay_weight(age_seconds: Option<f64>, half_life_seconds: f64) -> f64 {
    let half_life = if half_life_seconds <= 0.0 {
        DEFAULT_HALF_LIFE_SECONDS
    } else {
        half_life_seconds
    };
    match age_seconds {
        None => 0.5,
        Some(age) if age < 0.0 => 1.0,
        Some(age) => 0.5_f64.powf(age / half_life).clamp(0.0, 1.0),
    }
}

/// Convenience: decay weight for a level timestamped `level_ts_ms` as observed
/// at `now_ms`, both in milliseconds since epoch.
pub fn decay_weight_ms(level_ts_ms: i64, now_ms: i64, half_life_seconds: f64) -> f64 {
    let age_seconds = (now_ms - level_ts_ms) as f64 / 1000.0;
    time_decay_weight(Some(age_seconds), half_life_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_age_is_full_weight() {
        assert_eq!(time_decay_weight(Some(0.0), DEFAULT_HALF_LIFE_SECONDS), 1.0);
    }

    #[test]
    fn strictly_decreasing_with_age() {
        let w1 = time_decay_weight(Some(1_000.0), DEFAULT_HALF_LIFE_SECONDS);
        let w2 = time_decay_weight(Some(10_000.0), DEFAULT_HALF_LIFE_SECONDS);
        let w3 = time_decay_weight(Some(DEFAULT_HALF_LIFE_SECONDS), DEFAULT_HALF_LIFE_SECONDS);
        assert!(w1 > w2);
        assert!(w2 > w3);
        assert!((w3 - 0.5).abs() < 1e-9);
    }

    #[test]
    fn future_timestamp_is_fresh() {
        assert_eq!(time_decay_weight(Some(-5.0), DEFAULT_HALF_LIFE_SECONDS), 1.0);
    }

    #[test]
    fn missing_timestamp_defaults_to_half() {
        assert_eq!(time_decay_weight(None, DEFAULT_HALF_LIFE_SECONDS), 0.5);
    }
}
