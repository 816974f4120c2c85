//! Real-time market-intelligence and signal-generation core.
//!
//! Exposes the analytical engines, the decision/alert/health layers, and the
//! feed abstraction for use by the supervisor binary and integration tests.

pub mod alerts;
pub mod behavior;
pub mod config;
pub mod decision;
pub mod error;
pub mod feed;
pub mod health;
pub mod liquidity;
pub mod models;
pub mod pipeline;
pub mod quality;
pub mod structure;
pub mod svd;
pub mod technical;
pub mod trap;
pub mod util;

pub use config::Config;
pub use error::PipelineError;
pub use pipeline::Pipeline;
