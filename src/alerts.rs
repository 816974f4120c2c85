//! Alert manager: fires on phase changes, CVD intent flips, execution-phase
//! entries, and strong signals. Keeps a capped history and last-seen state
//! across ticks so it only alerts on a transition, not on every tick.
//!
//! Grounded in `modules/alerts/alert_manager.py`. Its Telegram formatter and
//! emoji-laden Russian message templates have no counterpart here — out of
//! scope per the presentation-layer non-goal; messages below are plain
//! English sentences describing the same transitions.

use crate::models::{AlertKind, AlertRecord, AlertSeverity, Phase, SignalDirection};
use crate::svd::intent::Intent;
use std::collections::VecDeque;

const HISTORY_CAP: usize = 50;
const EXECUTION_ALERT_COOLDOWN_MS: i64 = 15 * 60 * 1000;
const STRONG_SIGNAL_THRESHOLD: f64 = 7.0;

pub struct AlertManager {
    history: VecDeque<AlertRecord>,
    last_phase: Option<Phase>,
    last_intent: Option<Intent>,
    last_execution_alert_ms: Option<i64>,
}

impl AlertManager {
    pub fn new() -> Self {
        Self { history: VecDeque::new(), last_phase: None, last_intent: None, last_execution_alert_ms: None }
    }

    pub fn history(&self) -> &VecDeque<AlertRecord> {
        &self.history
    }

    pub fn check_phase_change(&mut self, current_phase: Phase, phase_duration_secs: f64, now_ms: i64) -> Option<AlertRecord> {
        let previous = self.last_phase.replace(current_phase)?;
        if previous == current_phase {
            return None;
        }

        let severity = if matches!(current_phase, Phase::Execution | Phase::Distribution) {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        };

        let record = AlertRecord {
            kind: AlertKind::PhaseChange,
            severity,
            timestamp_ms: now_ms,
            message: phase_change_message(previous, current_phase, phase_duration_secs),
            payload: serde_json::json!({
                "from_phase": format!("{previous:?}"),
                "to_phase": format!("{current_phase:?}"),
                "duration_secs": phase_duration_secs,
            }),
        };
        self.push(record.clone());
        Some(record)
    }

    /// Mirrors `check_cvd_reversal`: an intent-flip alert, when it fires,
    /// takes priority over a reversal alert for the same tick.
    pub fn check_cvd_reversal(&mut self, intent: Intent, cvd: f64, cvd_slope: f64, reversal_detected: bool, now_ms: i64) -> Option<AlertRecord> {
        let previous = self.last_intent.replace(intent);

        if let Some(prev) = previous {
            if prev != intent && matches!(intent, Intent::Accumulating | Intent::Distributing) {
                let record = AlertRecord {
                    kind: AlertKind::CvdIntentChange,
                    severity: AlertSeverity::High,
                    timestamp_ms: now_ms,
                    message: cvd_intent_change_message(prev, intent, cvd, cvd_slope),
                    payload: serde_json::json!({
                        "from_intent": format!("{prev:?}"),
                        "to_intent": format!("{intent:?}"),
                        "cvd": cvd,
                        "cvd_slope": cvd_slope,
                        "reversal": reversal_detected,
                    }),
                };
                self.push(record.clone());
                return Some(record);
            }
        }

        if reversal_detected {
            let record = AlertRecord {
                kind: AlertKind::CvdReversal,
                severity: AlertSeverity::High,
                timestamp_ms: now_ms,
                message: format!("trend reversal: CVD={cvd:.1}, slope={cvd_slope:.1} -> {intent:?}"),
                payload: serde_json::json!({ "intent": format!("{intent:?}"), "cvd": cvd, "cvd_slope": cvd_slope }),
            };
            self.push(record.clone());
            return Some(record);
        }

        None
    }

    pub fn check_execution_phase(&mut self, phase: Phase, intent: Intent, cvd: f64, confidence: f64, now_ms: i64) -> Option<AlertRecord> {
        if phase != Phase::Execution {
            return None;
        }
        if let Some(last) = self.last_execution_alert_ms {
            if now_ms - last < EXECUTION_ALERT_COOLDOWN_MS {
                return None;
            }
        }

        let record = AlertRecord {
            kind: AlertKind::ExecutionPhase,
            severity: AlertSeverity::Critical,
            timestamp_ms: now_ms,
            message: execution_phase_message(intent, cvd, confidence),
            payload: serde_json::json!({ "intent": format!("{intent:?}"), "cvd": cvd, "confidence": confidence }),
        };
        self.last_execution_alert_ms = Some(now_ms);
        self.push(record.clone());
        Some(record)
    }

    pub fn check_strong_signal(&mut self, direction: SignalDirection, confidence: f64, now_ms: i64) -> Option<AlertRecord> {
        if !matches!(direction, SignalDirection::Buy | SignalDirection::Sell) || confidence < STRONG_SIGNAL_THRESHOLD {
            return None;
        }

        let record = AlertRecord {
            kind: AlertKind::StrongSignal,
            severity: AlertSeverity::High,
            timestamp_ms: now_ms,
            message: format!("strong signal: {direction:?} (confidence {confidence:.1}/10)"),
            payload: serde_json::json!({ "direction": format!("{direction:?}"), "confidence": confidence }),
        };
        self.push(record.clone());
        Some(record)
    }

    pub fn get_recent_alerts(&self, now_ms: i64, window_secs: i64, severity: Option<AlertSeverity>) -> Vec<&AlertRecord> {
        let cutoff = now_ms - window_secs * 1000;
        self.history
            .iter()
            .filter(|a| a.timestamp_ms >= cutoff)
            .filter(|a| severity.map(|s| a.severity == s).unwrap_or(true))
            .collect()
    }

    fn push(&mut self, record: AlertRecord) {
        self.history.push_back(record);
        while self.history.len() > HISTORY_CAP {
            self.history.pop_front();
        }
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

fn phase_change_message(from: Phase, to: Phase, duration_secs: f64) -> String {
    let duration_min = duration_secs / 60.0;
    match (from, to) {
        (Phase::Manipulation, Phase::Execution) => format!("execution started after {duration_min:.1}m of manipulation"),
        (Phase::Execution, Phase::Distribution) => format!("distribution: whales finished buying (execution lasted {duration_min:.1}m)"),
        (Phase::Distribution, Phase::Manipulation) => "new cycle: distribution -> manipulation".to_string(),
        (Phase::Manipulation, Phase::Distribution) => "distribution: execution phase appears to have been skipped".to_string(),
        _ => format!("phase change: {from:?} -> {to:?}"),
    }
}

fn cvd_intent_change_message(from: Intent, to: Intent, cvd: f64, cvd_slope: f64) -> String {
    match (from, to) {
        (Intent::Accumulating, Intent::Distributing) => format!("whales started selling: CVD={cvd:.1}, slope={cvd_slope:.1}"),
        (Intent::Distributing, Intent::Accumulating) => format!("whales started buying: CVD={cvd:.1}, slope={cvd_slope:.1}"),
        _ => format!("CVD intent: {from:?} -> {to:?}"),
    }
}

fn execution_phase_message(intent: Intent, cvd: f64, confidence: f64) -> String {
    match intent {
        Intent::Accumulating => format!("execution: whales are buying, CVD={cvd:.1}, confidence={confidence:.1}/10"),
        Intent::Distributing => format!("execution: whales are selling, CVD={cvd:.1}, confidence={confidence:.1}/10"),
        Intent::Unclear => format!("execution phase, CVD={cvd:.1}"),
    }
}
