//! Environment-driven configuration for the analysis core.
//!
//! Every tunable in the configuration table loads through one
//! `env::var(...).ok().and_then(...).unwrap_or(default)` chain, `.env`-aware
//! via `dotenv`.

#[derive(Debug, Clone)]
pub struct Config {
    pub symbol: String,
    pub analysis_interval_secs: u64,
    pub min_data_quality: f64,
    pub max_age_ohlcv_secs: f64,
    pub max_age_orderbook_secs: f64,
    pub max_age_trades_secs: f64,
    pub min_orderbook_levels: usize,
    pub min_trades_count: usize,
    pub min_ohlcv_candles: usize,
    pub htf_1_interval: String,
    pub htf_2_interval: String,
    pub htf_limit: usize,
    pub execution_only_signals: bool,
    pub critical_conflict_threshold: usize,
    pub trap_score_threshold: f64,
    pub min_confidence_to_trade: f64,
    pub ws_depth_level: usize,
    pub ws_trades_buffer: usize,
    pub ws_reconnect_backoff_seq_secs: Vec<u64>,
    pub swept_level_expiry_hours: f64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let symbol = std::env::var("SMV_SYMBOL").unwrap_or_else(|_| "BTCUSDT".to_string());

        let ws_reconnect_backoff_seq_secs = std::env::var("SMV_WS_RECONNECT_BACKOFF_SEQ")
            .ok()
            .map(|v| {
                v.split(',')
                    .filter_map(|s| s.trim().parse::<u64>().ok())
                    .collect::<Vec<_>>()
            })
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec![1, 2, 5, 15, 30]);

        Ok(Self {
            symbol,
            analysis_interval_secs: env_parse("SMV_ANALYSIS_INTERVAL", 180),
            min_data_quality: env_parse("SMV_MIN_DATA_QUALITY", 0.5),
            max_age_ohlcv_secs: env_parse("SMV_MAX_AGE_OHLCV", 600.0),
            max_age_orderbook_secs: env_parse("SMV_MAX_AGE_ORDERBOOK", 10.0),
            max_age_trades_secs: env_parse("SMV_MAX_AGE_TRADES", 30.0),
            min_orderbook_levels: env_parse("SMV_MIN_ORDERBOOK_LEVELS", 5),
            min_trades_count: env_parse("SMV_MIN_TRADES_COUNT", 20),
            min_ohlcv_candles: env_parse("SMV_MIN_OHLCV_CANDLES", 50),
            htf_1_interval: std::env::var("SMV_HTF_1_INTERVAL").unwrap_or_else(|_| "1h".to_string()),
            htf_2_interval: std::env::var("SMV_HTF_2_INTERVAL").unwrap_or_else(|_| "4h".to_string()),
            htf_limit: env_parse("SMV_HTF_LIMIT", 100),
            execution_only_signals: env_bool("SMV_EXECUTION_ONLY_SIGNALS", false),
            critical_conflict_threshold: env_parse("SMV_CRITICAL_CONFLICT_THRESHOLD", 2),
            trap_score_threshold: env_parse("SMV_TRAP_SCORE_THRESHOLD", 3.0),
            min_confidence_to_trade: env_parse("SMV_MIN_CONFIDENCE_TO_TRADE", 4.0),
            ws_depth_level: env_parse("SMV_WS_DEPTH_LEVEL", 20),
            ws_trades_buffer: env_parse("SMV_WS_TRADES_BUFFER", 1000),
            ws_reconnect_backoff_seq_secs,
            swept_level_expiry_hours: env_parse("SMV_SWEPT_LEVEL_EXPIRY_HOURS", 24.0),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            analysis_interval_secs: 180,
            min_data_quality: 0.5,
            max_age_ohlcv_secs: 600.0,
            max_age_orderbook_secs: 10.0,
            max_age_trades_secs: 30.0,
            min_orderbook_levels: 5,
            min_trades_count: 20,
            min_ohlcv_candles: 50,
            htf_1_interval: "1h".to_string(),
            htf_2_interval: "4h".to_string(),
            htf_limit: 100,
            execution_only_signals: false,
            critical_conflict_threshold: 2,
            trap_score_threshold: 3.0,
            min_confidence_to_trade: 4.0,
            ws_depth_level: 20,
            ws_trades_buffer: 1000,
            ws_reconnect_backoff_seq_secs: vec![1, 2, 5, 15, 30],
            swept_level_expiry_hours: 24.0,
        }
    }
}
