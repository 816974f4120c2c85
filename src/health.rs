//! Health monitoring: uptime, signal/error counters, API success rate,
//! WebSocket reconnect counts, and a cached system-metrics snapshot, rolled
//! up into a healthy/degraded/unhealthy status.
//!
//! Grounded in `modules/utils/healthcheck.py`. System metrics use the
//! `sysinfo` crate (the cached-`System`-instance pattern already present in
//! `performance::memory::MemoryProfiler::system_memory`) instead of `psutil`.

use crate::models::SignalDirection;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use sysinfo::System;

const UNHEALTHY_NO_SIGNAL_SECS: f64 = 600.0;
const DEGRADED_NO_SIGNAL_SECS: f64 = 300.0;
const UNHEALTHY_API_SUCCESS_RATE: f64 = 0.5;
const DEGRADED_API_SUCCESS_RATE: f64 = 0.8;
const UNHEALTHY_WS_RECONNECTS: u64 = 50;
const DEGRADED_WS_RECONNECTS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub memory_available_mb: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub uptime_seconds: f64,
    pub uptime_hours: f64,
    pub last_signal_seconds_ago: Option<f64>,
    pub signal_count: u64,
    pub buy_count: u64,
    pub sell_count: u64,
    pub wait_count: u64,
    pub error_count: u64,
    pub api_calls: u64,
    pub api_errors: u64,
    pub api_success_rate: f64,
    pub ws_reconnects: u64,
    pub system: SystemMetrics,
}

pub struct HealthMonitor {
    start: Instant,
    last_signal_at: Mutex<Option<Instant>>,
    signal_count: AtomicU64,
    buy_count: AtomicU64,
    sell_count: AtomicU64,
    wait_count: AtomicU64,
    error_count: AtomicU64,
    api_call_count: AtomicU64,
    api_error_count: AtomicU64,
    ws_reconnect_count: AtomicU64,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last_signal_at: Mutex::new(None),
            signal_count: AtomicU64::new(0),
            buy_count: AtomicU64::new(0),
            sell_count: AtomicU64::new(0),
            wait_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            api_call_count: AtomicU64::new(0),
            api_error_count: AtomicU64::new(0),
            ws_reconnect_count: AtomicU64::new(0),
        }
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    pub fn record_signal(&self, direction: SignalDirection) {
        *self.last_signal_at.lock() = Some(Instant::now());
        self.signal_count.fetch_add(1, Ordering::Relaxed);
        let counter = match direction {
            SignalDirection::Buy => &self.buy_count,
            SignalDirection::Sell => &self.sell_count,
            SignalDirection::Wait => &self.wait_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_call(&self, success: bool) {
        self.api_call_count.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.api_error_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_ws_reconnect(&self) {
        self.ws_reconnect_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads cached, process + system-wide cpu/memory via a lazily
    /// initialized `System`. Mirrors the sysinfo usage already established
    /// for memory profiling elsewhere in this codebase.
    pub fn system_metrics(&self) -> SystemMetrics {
        static CACHED_SYSTEM: OnceLock<Mutex<System>> = OnceLock::new();
        let sys_mutex = CACHED_SYSTEM.get_or_init(|| Mutex::new(System::new_all()));
        let mut sys = sys_mutex.lock();
        sys.refresh_cpu();
        sys.refresh_memory();

        let cpu_percent = sys.global_cpu_info().cpu_usage();
        let total = sys.total_memory().max(1) as f64;
        let available = sys.available_memory() as f64;
        let memory_percent = (1.0 - available / total) as f32 * 100.0;

        SystemMetrics { cpu_percent, memory_percent, memory_available_mb: available / (1024.0 * 1024.0) }
    }

    pub fn status(&self) -> HealthStatus {
        let uptime = self.uptime_seconds();
        let last_signal_ago = self.last_signal_at.lock().map(|t| t.elapsed().as_secs_f64());

        let api_calls = self.api_call_count.load(Ordering::Relaxed);
        let api_errors = self.api_error_count.load(Ordering::Relaxed);
        let api_success_rate = if api_calls > 0 { 1.0 - (api_errors as f64 / api_calls as f64) } else { 1.0 };
        let ws_reconnects = self.ws_reconnect_count.load(Ordering::Relaxed);

        let status = if last_signal_ago.is_some_and(|s| s > UNHEALTHY_NO_SIGNAL_SECS)
            || api_success_rate < UNHEALTHY_API_SUCCESS_RATE
            || ws_reconnects > UNHEALTHY_WS_RECONNECTS
        {
            HealthState::Unhealthy
        } else if last_signal_ago.is_some_and(|s| s > DEGRADED_NO_SIGNAL_SECS)
            || api_success_rate < DEGRADED_API_SUCCESS_RATE
            || ws_reconnects > DEGRADED_WS_RECONNECTS
        {
            HealthState::Degraded
        } else {
            HealthState::Healthy
        };

        HealthStatus {
            status,
            uptime_seconds: uptime,
            uptime_hours: uptime / 3600.0,
            last_signal_seconds_ago: last_signal_ago,
            signal_count: self.signal_count.load(Ordering::Relaxed),
            buy_count: self.buy_count.load(Ordering::Relaxed),
            sell_count: self.sell_count.load(Ordering::Relaxed),
            wait_count: self.wait_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            api_calls,
            api_errors,
            api_success_rate,
            ws_reconnects,
            system: self.system_metrics(),
        }
    }

    pub fn log_status(&self) {
        let status = self.status();
        match status.status {
            HealthState::Healthy => tracing::info!(
                uptime_hours = status.uptime_hours,
                signals = status.signal_count,
                api_success_rate = status.api_success_rate,
                "health: healthy"
            ),
            HealthState::Degraded => tracing::warn!(
                uptime_hours = status.uptime_hours,
                signals = status.signal_count,
                api_success_rate = status.api_success_rate,
                ws_reconnects = status.ws_reconnects,
                "health: degraded"
            ),
            HealthState::Unhealthy => tracing::error!(
                uptime_hours = status.uptime_hours,
                last_signal_seconds_ago = status.last_signal_seconds_ago,
                api_success_rate = status.api_success_rate,
                ws_reconnects = status.ws_reconnects,
                "health: unhealthy"
            ),
        }
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_monitor_is_healthy() {
        let monitor = HealthMonitor::new();
        assert_eq!(monitor.status().status, HealthState::Healthy);
    }

    #[test]
    fn low_api_success_rate_is_unhealthy() {
        let monitor = HealthMonitor::new();
        for _ in 0..10 {
            monitor.record_api_call(false);
        }
        assert_eq!(monitor.status().status, HealthState::Unhealthy);
    }

    #[test]
    fn many_ws_reconnects_is_degraded() {
        let monitor = HealthMonitor::new();
        for _ in 0..25 {
            monitor.record_ws_reconnect();
        }
        assert_eq!(monitor.status().status, HealthState::Degraded);
    }

    #[test]
    fn signal_recording_buckets_by_direction() {
        let monitor = HealthMonitor::new();
        monitor.record_signal(SignalDirection::Buy);
        monitor.record_signal(SignalDirection::Buy);
        monitor.record_signal(SignalDirection::Wait);
        let status = monitor.status();
        assert_eq!(status.buy_count, 2);
        assert_eq!(status.wait_count, 1);
        assert_eq!(status.signal_count, 3);
    }
}
