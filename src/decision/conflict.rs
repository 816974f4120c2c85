//! Cross-module conflict detection: flags when engines disagree about
//! direction before a signal is allowed through.
//!
//! Grounded in `modules/decision/conflict_detector.py`.

use crate::models::{BookSide, Direction, SignalDirection};
use crate::structure::Trend;
use crate::svd::intent::Intent;
use crate::technical::TaTrend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    None,
    Minor,
    Major,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    LiquidityVsSvd,
    SignalVsSvd,
    SignalVsDom,
    SignalVsThin,
    StructureVsTa,
    PhaseVsSignal,
    LtfVsHtf,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Conflict {
    pub kind: ConflictType,
    pub severity: ConflictSeverity,
    pub description: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConflictReport {
    pub has_conflicts: bool,
    pub conflict_count: usize,
    pub critical_conflicts: usize,
    pub conflicts: Vec<Conflict>,
    pub severity: ConflictSeverity,
}

impl Default for ConflictReport {
    fn default() -> Self {
        Self { has_conflicts: false, conflict_count: 0, critical_conflicts: 0, conflicts: Vec::new(), severity: ConflictSeverity::None }
    }
}

/// Everything `detect_conflicts` needs from the other engines for one tick.
pub struct ConflictInputs {
    pub liquidity_direction: Direction,
    pub svd_intent: Intent,
    pub svd_phase_is_execution_or_distribution: bool,
    pub structure_trend: Trend,
    pub ta_trend: TaTrend,
    pub signal: SignalDirection,
    pub dom_side: Option<BookSide>,
    pub thin_above: bool,
    pub thin_below: bool,
    pub htf1_trend: Option<Trend>,
}

pub struct ConflictDetector {
    critical_conflict_threshold: usize,
}

impl ConflictDetector {
    pub fn new(critical_conflict_threshold: usize) -> Self {
        Self { critical_conflict_threshold }
    }

    pub fn detect_conflicts(&self, inputs: &ConflictInputs) -> ConflictReport {
        let mut conflicts = Vec::new();
        let mut critical_count = 0;

        if (inputs.liquidity_direction == Direction::Up && inputs.svd_intent == Intent::Distributing)
            || (inputs.liquidity_direction == Direction::Down && inputs.svd_intent == Intent::Accumulating)
        {
            conflicts.push(Conflict {
                kind: ConflictType::LiquidityVsSvd,
                severity: ConflictSeverity::Critical,
                description: "liquidity direction opposes SVD intent".to_string(),
            });
            critical_count += 1;
        }

        if (inputs.signal == SignalDirection::Buy && inputs.svd_intent == Intent::Distributing)
            || (inputs.signal == SignalDirection::Sell && inputs.svd_intent == Intent::Accumulating)
        {
            conflicts.push(Conflict {
                kind: ConflictType::SignalVsSvd,
                severity: ConflictSeverity::Critical,
                description: "final signal opposes SVD intent".to_string(),
            });
            critical_count += 1;
        }

        if (inputs.signal == SignalDirection::Buy && inputs.dom_side == Some(BookSide::Ask))
            || (inputs.signal == SignalDirection::Sell && inputs.dom_side == Some(BookSide::Bid))
        {
            conflicts.push(Conflict {
                kind: ConflictType::SignalVsDom,
                severity: ConflictSeverity::Major,
                description: "order-book imbalance presses against the signal".to_string(),
            });
        }

        if (inputs.signal == SignalDirection::Buy && inputs.thin_below && !inputs.thin_above)
            || (inputs.signal == SignalDirection::Sell && inputs.thin_above && !inputs.thin_below)
        {
            conflicts.push(Conflict {
                kind: ConflictType::SignalVsThin,
                severity: ConflictSeverity::Major,
                description: "thin liquidity sits on the side opposite the signal".to_string(),
            });
        }

        if (inputs.structure_trend == Trend::Bullish && inputs.ta_trend == TaTrend::Bearish)
            || (inputs.structure_trend == Trend::Bearish && inputs.ta_trend == TaTrend::Bullish)
        {
            conflicts.push(Conflict {
                kind: ConflictType::StructureVsTa,
                severity: ConflictSeverity::Minor,
                description: "structural trend and technical trend disagree".to_string(),
            });
        }

        if !inputs.svd_phase_is_execution_or_distribution && inputs.signal != SignalDirection::Wait {
            conflicts.push(Conflict {
                kind: ConflictType::PhaseVsSignal,
                severity: ConflictSeverity::Major,
                description: "an aggressive signal fired outside execution/distribution phase".to_string(),
            });
        }

        if let Some(htf1) = inputs.htf1_trend {
            if (inputs.structure_trend == Trend::Bullish && htf1 == Trend::Bearish)
                || (inputs.structure_trend == Trend::Bearish && htf1 == Trend::Bullish)
            {
                conflicts.push(Conflict {
                    kind: ConflictType::LtfVsHtf,
                    severity: ConflictSeverity::Minor,
                    description: "local trend disagrees with higher-timeframe trend".to_string(),
                });
            }
        }

        let severity = if critical_count >= self.critical_conflict_threshold {
            ConflictSeverity::Critical
        } else if critical_count > 0 {
            ConflictSeverity::Major
        } else if conflicts.len() >= 3 {
            ConflictSeverity::Major
        } else if !conflicts.is_empty() {
            ConflictSeverity::Minor
        } else {
            ConflictSeverity::None
        };

        ConflictReport {
            has_conflicts: !conflicts.is_empty(),
            conflict_count: conflicts.len(),
            critical_conflicts: critical_count,
            conflicts,
            severity,
        }
    }

    /// Mirrors `should_force_wait`: critical severity always forces WAIT.
    pub fn should_force_wait(&self, report: &ConflictReport) -> bool {
        report.severity == ConflictSeverity::Critical
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_inputs() -> ConflictInputs {
        ConflictInputs {
            liquidity_direction: Direction::Neutral,
            svd_intent: Intent::Unclear,
            svd_phase_is_execution_or_distribution: true,
            structure_trend: Trend::Range,
            ta_trend: TaTrend::Neutral,
            signal: SignalDirection::Wait,
            dom_side: None,
            thin_above: false,
            thin_below: false,
            htf1_trend: None,
        }
    }

    #[test]
    fn liquidity_vs_svd_is_critical() {
        let mut inputs = base_inputs();
        inputs.liquidity_direction = Direction::Up;
        inputs.svd_intent = Intent::Distributing;
        let detector = ConflictDetector::default();
        let report = detector.detect_conflicts(&inputs);
        assert_eq!(report.critical_conflicts, 1);
        assert_eq!(report.severity, ConflictSeverity::Major);
    }

    #[test]
    fn two_critical_conflicts_force_wait() {
        let mut inputs = base_inputs();
        inputs.liquidity_direction = Direction::Up;
        inputs.svd_intent = Intent::Distributing;
        inputs.signal = SignalDirection::Buy;
        let detector = ConflictDetector::default();
        let report = detector.detect_conflicts(&inputs);
        assert_eq!(report.critical_conflicts, 2);
        assert!(detector.should_force_wait(&report));
    }

    #[test]
    fn no_conflicts_is_clean() {
        let detector = ConflictDetector::default();
        let report = detector.detect_conflicts(&base_inputs());
        assert!(!report.has_conflicts);
        assert_eq!(report.severity, ConflictSeverity::None);
    }
}
