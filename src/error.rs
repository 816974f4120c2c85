//! The five error kinds the pipeline distinguishes, and how each is handled
//! by the supervisor. Engines themselves stay infallible (they return
//! degenerate-but-structured results); these variants are reserved for the
//! feed/config/supervision boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("data stale: {0}")]
    DataStale(String),

    #[error("data shallow: {0}")]
    DataShallow(String),

    #[error("engine failure in {engine}: {source}")]
    EngineFailure {
        engine: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("feed transient error: {0}")]
    FeedTransient(String),

    #[error("config error: {0}")]
    ConfigError(String),
}

impl PipelineError {
    /// Whether the supervisor should treat this as fatal (refuse to run) vs.
    /// skip-and-retry-next-tick.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::ConfigError(_))
    }
}
