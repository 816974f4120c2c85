//! The composing pipeline: pulls one snapshot from a `FeedSource`, runs it
//! through the full engine chain in a fixed sequential order, and emits a
//! `SignalRecord` plus whatever alerts fired along the way.
//!
//! Grounded in the CONCURRENCY & RESOURCE MODEL section: a tick is
//! cooperative and strictly sequential — engines never run in parallel, and
//! all cross-tick state (swept-level tracker, CVD calculator, spoof/dom
//! trackers, phase tracker, alert history) lives inside the engine/manager
//! instances the pipeline owns, not in any lock visible to the caller.

use crate::behavior::BehaviorEngine;
use crate::config::Config;
use crate::decision::{DecisionEngine, HtfContext};
use crate::error::PipelineError;
use crate::feed::FeedSource;
use crate::health::HealthMonitor;
use crate::liquidity::LiquidityEngine;
use crate::models::SignalRecord;
use crate::quality::DataQualityValidator;
use crate::structure::{MarketStructureEngine, Trend};
use crate::svd::SvdEngine;
use crate::trap::TrapEngine;
use crate::alerts::AlertManager;
use std::sync::Arc;

/// Base OHLCV candle interval the core trades on. Higher-timeframe
/// candles (`config.htf_1_interval`/`htf_2_interval`) are fetched
/// separately and only ever feed `HtfContext`.
const BASE_TIMEFRAME: &str = "1m";

pub struct Pipeline {
    config: Config,
    quality: DataQualityValidator,
    structure: MarketStructureEngine,
    technical: crate::technical::TechnicalEngine,
    liquidity: LiquidityEngine,
    svd: SvdEngine,
    trap: TrapEngine,
    behavior: BehaviorEngine,
    decision: DecisionEngine,
    alerts: AlertManager,
    health: Arc<HealthMonitor>,
}

impl Pipeline {
    pub fn new(config: Config, health: Arc<HealthMonitor>) -> Self {
        let liquidity = LiquidityEngine::new(config.swept_level_expiry_hours);
        let trap = TrapEngine::new(config.trap_score_threshold);
        let decision = DecisionEngine::new(config.critical_conflict_threshold, config.min_confidence_to_trade, config.execution_only_signals);

        Self {
            config,
            quality: DataQualityValidator::new(),
            structure: MarketStructureEngine::new(),
            technical: crate::technical::TechnicalEngine::new(),
            liquidity,
            svd: SvdEngine::new(),
            trap,
            behavior: BehaviorEngine::new(),
            decision,
            alerts: AlertManager::new(),
            health,
        }
    }

    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }

    /// Runs one tick against `feed`: pull a consistent snapshot of
    /// candles/order-book/trades, validate it, and — if it clears the
    /// quality floor — run the full engine chain. Returns `Ok(None)` when
    /// the tick is aborted for low data quality (the health counter still
    /// records the miss; this is not an error).
    pub async fn run_tick(&mut self, feed: &dyn FeedSource, now_ms: i64, htf: Option<HtfContext>) -> anyhow::Result<Option<SignalRecord>> {
        let fetch_limit = self.config.min_ohlcv_candles.max(200);
        let (ohlcv, _fetch_ts) = match feed.fetch_ohlcv(BASE_TIMEFRAME, fetch_limit).await {
            Ok(v) => v,
            Err(e) => {
                self.health.record_api_call(false);
                self.health.record_error();
                return Err(PipelineError::FeedTransient(e.to_string()).into());
            }
        };
        self.health.record_api_call(true);

        let book = match feed.get_orderbook_snapshot().await {
            Some(b) => b,
            None => {
                self.health.record_error();
                return Err(PipelineError::DataUnavailable("no order-book snapshot available".to_string()).into());
            }
        };
        let trades = feed.get_trades_snapshot().await;

        let quality = self.quality.validate_all(&ohlcv, &book, &trades, now_ms, &self.config);
        if quality.overall_quality < self.config.min_data_quality {
            self.health.record_error();
            tracing::warn!(overall_quality = quality.overall_quality, floor = self.config.min_data_quality, "tick aborted: data quality below floor");
            return Ok(None);
        }

        let current_price = match ohlcv.last() {
            Some(c) => c.close,
            None => {
                self.health.record_error();
                return Err(PipelineError::DataShallow("ohlcv is empty after passing quality validation".to_string()).into());
            }
        };

        let structure = self.structure.analyze(&ohlcv);
        let technical = self.technical.analyze(&ohlcv);
        let liquidity = self.liquidity.analyze(&ohlcv, &structure, now_ms);
        let svd = self.svd.analyze(&trades, &book, current_price, Some(technical.atr_pct), now_ms);
        let trap = self.trap.analyze(&svd, &liquidity);
        let behavior = self.behavior.analyze(&svd, &trap);

        let signal = self.decision.analyze(&liquidity, &svd, &structure, &technical, &trap, &behavior, current_price, htf.as_ref(), quality.overall_quality);

        self.health.record_signal(signal.direction);

        self.alerts.check_phase_change(svd.phase, svd.phase_update.phase_duration_secs, now_ms);
        self.alerts.check_cvd_reversal(svd.intent.intent, svd.cvd.cvd, svd.cvd.cvd_slope, svd.intent.reversal_detected, now_ms);
        self.alerts.check_execution_phase(svd.phase, svd.intent.intent, svd.cvd.cvd, signal.confidence, now_ms);
        self.alerts.check_strong_signal(signal.direction, signal.confidence, now_ms);

        Ok(Some(signal))
    }
}

/// Fetches higher-timeframe candles and reduces them to a trend bias.
/// Auxiliary to the core: callers build this once per HTF refresh interval
/// and pass it into `run_tick`, rather than the pipeline recomputing it
/// every base-timeframe tick.
pub async fn compute_htf_context(feed: &dyn FeedSource, structure_engine: &MarketStructureEngine, htf_1_interval: &str, htf_2_interval: &str, limit: usize) -> anyhow::Result<HtfContext> {
    let htf1_trend = htf_trend(feed, structure_engine, htf_1_interval, limit).await?;
    let htf2_trend = htf_trend(feed, structure_engine, htf_2_interval, limit).await?;
    Ok(HtfContext { htf1_trend: Some(htf1_trend), htf2_trend: Some(htf2_trend) })
}

async fn htf_trend(feed: &dyn FeedSource, structure_engine: &MarketStructureEngine, interval: &str, limit: usize) -> anyhow::Result<Trend> {
    let candles = feed.fetch_htf_candles(interval, limit).await?;
    Ok(structure_engine.analyze(&candles).trend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FixtureFeed;

    #[tokio::test]
    async fn tick_produces_a_signal_on_a_healthy_fixture() {
        let config = Config::default();
        let health = Arc::new(HealthMonitor::new());
        let mut pipeline = Pipeline::new(config, health);
        let feed = FixtureFeed::new(100.0, 300, 60_000, 500);

        // The fixture's own clock starts at 0; evaluating freshness at the
        // same instant keeps every feed within its max-age floor.
        let result = pipeline.run_tick(feed.as_ref(), 0, None).await.unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn sparse_fixture_aborts_the_tick() {
        let config = Config::default();
        let health = Arc::new(HealthMonitor::new());
        let mut pipeline = Pipeline::new(config, health);
        let feed = FixtureFeed::new(100.0, 5, 60_000, 5);

        // Evaluated long after the fixture's clock: too few candles/trades
        // and everything stale, well under the data-quality floor.
        let result = pipeline.run_tick(feed.as_ref(), 999_000_000, None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn htf_context_reduces_to_a_trend_pair() {
        let feed = FixtureFeed::new(100.0, 300, 60_000, 200);
        let structure_engine = MarketStructureEngine::new();
        let ctx = compute_htf_context(feed.as_ref(), &structure_engine, "1h", "4h", 100).await.unwrap();
        assert!(ctx.htf1_trend.is_some());
        assert!(ctx.htf2_trend.is_some());
    }
}
