//! Supervisor binary: loads configuration, wires a feed source, and drives
//! the pipeline on a fixed interval for as long as the process runs.
//!
//! No live exchange adapter ships here (out of scope); the feed is a
//! deterministic `FixtureFeed` advanced by a background task standing in for
//! a WebSocket subscriber. Swapping in a real adapter only requires a new
//! `FeedSource` impl — the supervisor loop itself does not change.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smv_core::feed::{run_with_backoff, FeedSource, FixtureFeed};
use smv_core::health::HealthMonitor;
use smv_core::models::{AlertRecord, SignalRecord};
use smv_core::pipeline::{compute_htf_context, Pipeline};
use smv_core::Config;

/// Events the supervisor hands off to anything listening — a future API
/// layer, a logger task, or (today) just the health/alert log lines below.
#[derive(Debug, Clone)]
enum EngineEvent {
    Signal(SignalRecord),
    Alert(AlertRecord),
}

#[derive(Parser, Debug)]
#[command(name = "smv-core")]
#[command(about = "Real-time market-intelligence signal core")]
struct Args {
    /// Trading symbol, overrides SMV_SYMBOL / the config default.
    #[arg(long, env = "SMV_SYMBOL")]
    symbol: Option<String>,

    /// Run a fixed number of ticks then exit instead of running forever.
    /// Mainly useful for smoke-testing a deployment.
    #[arg(long)]
    ticks: Option<u64>,

    /// Fixture base price, only relevant since no live adapter is wired up.
    #[arg(long, env = "SMV_FIXTURE_BASE_PRICE", default_value = "65000")]
    fixture_base_price: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let mut config = Config::from_env().context("loading configuration from environment")?;
    if let Some(symbol) = args.symbol {
        config.symbol = symbol;
    }
    info!(symbol = %config.symbol, interval_secs = config.analysis_interval_secs, "starting supervisor");

    let health = Arc::new(HealthMonitor::new());
    let shutdown = Arc::new(AtomicBool::new(false));

    let feed = FixtureFeed::new(args.fixture_base_price, config.min_ohlcv_candles.max(200), 60_000, config.ws_trades_buffer.max(200));

    let (event_tx, _event_rx) = broadcast::channel::<EngineEvent>(1000);

    let subscriber_handle = {
        let feed = feed.clone();
        let backoff = config.ws_reconnect_backoff_seq_secs.clone();
        let inner_shutdown = shutdown.clone();
        tokio::spawn(async move {
            run_with_backoff("fixture-subscriber", &backoff, shutdown.clone(), || {
                let feed = feed.clone();
                let inner_shutdown = inner_shutdown.clone();
                async move {
                    while !inner_shutdown.load(Ordering::Relaxed) {
                        feed.advance();
                        tokio::time::sleep(Duration::from_millis(250)).await;
                    }
                    Ok(())
                }
            })
            .await;
        })
    };

    let health_logger = {
        let health = health.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(60));
            while !shutdown.load(Ordering::Relaxed) {
                ticker.tick().await;
                health.log_status();
            }
        })
    };

    let result = run_pipeline_loop(config, feed, health.clone(), shutdown.clone(), event_tx.clone(), args.ticks).await;

    shutdown.store(true, Ordering::Relaxed);
    subscriber_handle.abort();
    health_logger.abort();

    result
}

async fn run_pipeline_loop(config: Config, feed: Arc<FixtureFeed>, health: Arc<HealthMonitor>, shutdown: Arc<AtomicBool>, event_tx: broadcast::Sender<EngineEvent>, max_ticks: Option<u64>) -> Result<()> {
    let htf_1 = config.htf_1_interval.clone();
    let htf_2 = config.htf_2_interval.clone();
    let htf_limit = config.htf_limit;
    let tick_interval = Duration::from_secs(config.analysis_interval_secs.max(1));

    let mut pipeline = Pipeline::new(config, health.clone());
    let mut ticker = interval(tick_interval);
    let mut ticks_run = 0u64;
    let mut next_htf_refresh = 0i64;
    let mut htf = None;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        if let Some(limit) = max_ticks {
            if ticks_run >= limit {
                break;
            }
        }

        ticker.tick().await;
        let now_ms = now_millis();

        if now_ms >= next_htf_refresh {
            match compute_htf_context(feed.as_ref() as &dyn FeedSource, &smv_core::structure::MarketStructureEngine::new(), &htf_1, &htf_2, htf_limit).await {
                Ok(ctx) => htf = Some(ctx),
                Err(e) => warn!(error = %e, "failed to refresh higher-timeframe context, reusing previous"),
            }
            next_htf_refresh = now_ms + 15 * 60 * 1000;
        }

        match pipeline.run_tick(feed.as_ref() as &dyn FeedSource, now_ms, htf.clone()).await {
            Ok(Some(signal)) => {
                info!(direction = ?signal.direction, confidence = signal.confidence, "signal");
                let _ = event_tx.send(EngineEvent::Signal(signal));
            }
            Ok(None) => {}
            Err(e) => error!(error = %e, "tick failed"),
        }
        // Alerts fired this tick all carry `now_ms` as their timestamp, so
        // this filter is exact regardless of where the bounded history
        // happens to sit relative to its cap.
        for alert in pipeline.alerts().history().iter().filter(|a| a.timestamp_ms == now_ms) {
            info!(kind = ?alert.kind, severity = ?alert.severity, message = %alert.message, "alert");
            let _ = event_tx.send(EngineEvent::Alert(alert.clone()));
        }

        ticks_run += 1;
    }

    Ok(())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "smv_core=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
