//! Data quality validation: freshness and completeness scoring for each feed.
//!
//! Every sub-validator returns a structured report even in the degenerate
//! case, per the no-short-circuit propagation policy — the pipeline decides
//! whether to abort, engines never panic on bad input.

use crate::config::Config;
use crate::models::{Ohlcv, OrderBook, Trade};

#[derive(Debug, Clone, Default)]
pub struct FeedQualityReport {
    pub valid: bool,
    pub quality_score: f64,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DataQualityReport {
    pub ohlcv: FeedQualityReport,
    pub orderbook: FeedQualityReport,
    pub trades: FeedQualityReport,
    pub overall_quality: f64,
}

const FEED_INVALID_FLOOR: f64 = 0.3;

pub struct DataQualityValidator;

impl DataQualityValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_ohlcv(&self, ohlcv: &Ohlcv, now_ms: i64, cfg: &Config) -> FeedQualityReport {
        let mut score = 1.0_f64;
        let mut issues = Vec::new();

        if ohlcv.len() < cfg.min_ohlcv_candles {
            score -= 0.3;
            issues.push(format!(
                "ohlcv count {} below floor {}",
                ohlcv.len(),
                cfg.min_ohlcv_candles
            ));
        }

        if let Some(last) = ohlcv.last() {
            let age_secs = (now_ms - last.timestamp_ms) as f64 / 1000.0;
            if age_secs > cfg.max_age_ohlcv_secs {
                score -= 0.4;
                issues.push(format!("ohlcv stale: {age_secs:.1}s old"));
            }
        } else {
            score -= 0.4;
            issues.push("ohlcv empty".to_string());
        }

        if ohlcv.len() >= 3 {
            let diffs: Vec<f64> = ohlcv
                .windows(2)
                .map(|w| (w[1].timestamp_ms - w[0].timestamp_ms) as f64)
                .collect();
            let median = median(&diffs);
            if median > 0.0 && diffs.iter().any(|&d| d > 2.0 * median) {
                score -= 0.1;
                issues.push("ohlcv timestamp gaps exceed 2x median".to_string());
            }
        }

        if ohlcv
            .iter()
            .any(|c| c.open <= 0.0 || c.high <= 0.0 || c.low <= 0.0 || c.close <= 0.0)
        {
            score -= 0.2;
            issues.push("ohlcv contains non-positive prices".to_string());
        }

        score = score.max(0.0);
        FeedQualityReport {
            valid: score >= FEED_INVALID_FLOOR,
            quality_score: score,
            issues,
        }
    }

    pub fn validate_orderbook(&self, book: &OrderBook, now_ms: i64, cfg: &Config) -> FeedQualityReport {
        let mut score = 1.0_f64;
        let mut issues = Vec::new();

        if book.bids.len() < cfg.min_orderbook_levels || book.asks.len() < cfg.min_orderbook_levels {
            score -= 0.2;
            issues.push("orderbook depth below floor".to_string());
        }

        match book.timestamp_ms {
            Some(ts) => {
                let age_secs = (now_ms - ts) as f64 / 1000.0;
                if age_secs > cfg.max_age_orderbook_secs {
                    score -= 0.5;
                    issues.push(format!("orderbook stale: {age_secs:.1}s old"));
                }
            }
            None => {
                score -= 0.5;
                issues.push("orderbook has no timestamp".to_string());
            }
        }

        if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
            if bid >= ask {
                score -= 0.3;
                issues.push(format!("orderbook crossed: best_bid {bid} >= best_ask {ask}"));
            }
        }

        if book.bids.iter().any(|l| l.size == 0.0) || book.asks.iter().any(|l| l.size == 0.0) {
            score -= 0.1;
            issues.push("orderbook contains zero-size levels".to_string());
        }

        score = score.max(0.0);
        FeedQualityReport {
            valid: score >= FEED_INVALID_FLOOR,
            quality_score: score,
            issues,
        }
    }

    pub fn validate_trades(&self, trades: &[Trade], now_ms: i64, cfg: &Config) -> FeedQualityReport {
        let mut score = 1.0_f64;
        let mut issues = Vec::new();

        if trades.len() < cfg.min_trades_count {
            score -= 0.3;
            issues.push(format!(
                "trades count {} below floor {}",
                trades.len(),
                cfg.min_trades_count
            ));
        }

        if let Some(last) = trades.last() {
            let age_secs = (now_ms - last.timestamp_ms) as f64 / 1000.0;
            if age_secs > cfg.max_age_trades_secs {
                score -= 0.4;
                issues.push(format!("trades stale: {age_secs:.1}s old"));
            }
        } else {
            score -= 0.4;
            issues.push("trades empty".to_string());
        }

        let invalid = trades
            .iter()
            .filter(|t| t.price <= 0.0 || t.volume <= 0.0)
            .count();
        if invalid > 0 && !trades.is_empty() {
            let fraction = invalid as f64 / trades.len() as f64;
            score -= (fraction * 0.3).min(0.3);
            issues.push(format!("{invalid} trades with invalid price/volume"));
        }

        score = score.max(0.0);
        FeedQualityReport {
            valid: score >= FEED_INVALID_FLOOR,
            quality_score: score,
            issues,
        }
    }

    pub fn validate_all(
        &self,
        ohlcv: &Ohlcv,
        book: &OrderBook,
        trades: &[Trade],
        now_ms: i64,
        cfg: &Config,
    ) -> DataQualityReport {
        let ohlcv_report = self.validate_ohlcv(ohlcv, now_ms, cfg);
        let orderbook_report = self.validate_orderbook(book, now_ms, cfg);
        let trades_report = self.validate_trades(trades, now_ms, cfg);

        let overall = ohlcv_report.quality_score * 0.3
            + orderbook_report.quality_score * 0.4
            + trades_report.quality_score * 0.3;

        if overall < cfg.min_data_quality {
            tracing::warn!(
                overall_quality = overall,
                floor = cfg.min_data_quality,
                "data quality below floor, tick will be aborted"
            );
        }

        DataQualityReport {
            ohlcv: ohlcv_report,
            orderbook: orderbook_report,
            trades: trades_report,
            overall_quality: overall,
        }
    }
}

impl Default for DataQualityValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookLevel, Side};

    fn candle(ts: i64, price: f64) -> crate::models::Candle {
        crate::models::Candle {
            open: price,
            high: price + 1.0,
            low: price - 1.0,
            close: price,
            volume: 10.0,
            timestamp_ms: ts,
        }
    }

    #[test]
    fn crossed_book_is_invalid() {
        let cfg = Config::default();
        let book = OrderBook {
            bids: vec![BookLevel { price: 105.0, size: 5.0 }; 5],
            asks: vec![BookLevel { price: 100.0, size: 5.0 }; 5],
            timestamp_ms: Some(0),
        };
        let report = DataQualityValidator::new().validate_orderbook(&book, 0, &cfg);
        assert!(!report.valid);
    }

    #[test]
    fn sparse_trades_fail_completeness_floor() {
        let cfg = Config::default();
        let trades: Vec<Trade> = (0..8)
            .map(|i| Trade {
                price: 100.0,
                volume: 1.0,
                side: Side::Buy,
                timestamp_ms: i,
            })
            .collect();
        let report = DataQualityValidator::new().validate_trades(&trades, 100, &cfg);
        assert!(report.quality_score < 1.0);
    }

    #[test]
    fn abort_below_floor_via_validate_all() {
        let cfg = Config::default();
        let ohlcv: Ohlcv = (0..60).map(|i| candle(i * 180_000, 100.0)).collect();
        let book = OrderBook {
            bids: vec![],
            asks: vec![],
            timestamp_ms: Some(-50_000),
        };
        let trades: Vec<Trade> = vec![];
        let report = DataQualityValidator::new().validate_all(&ohlcv, &book, &trades, 0, &cfg);
        assert!(report.overall_quality < cfg.min_data_quality);
    }
}
