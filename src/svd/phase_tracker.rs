//! Tracks the Smart Money phase sequence and validates transitions between
//! them: discovery → manipulation → execution → distribution → discovery.

use crate::models::{Phase, PhaseRecord};
use std::collections::VecDeque;

const DEFAULT_HISTORY_SIZE: usize = 10;
const CONFIDENCE_DURATION_BONUS_SECS: f64 = 60.0;
const CONFIDENCE_DURATION_BONUS: f64 = 0.2;

#[derive(Debug, Clone, Copy)]
pub struct PhaseUpdate {
    pub phase: Phase,
    pub phase_changed: bool,
    pub phase_duration_secs: f64,
    pub is_valid_transition: bool,
    pub phase_confidence: f64,
}

pub struct PhaseTracker {
    history_size: usize,
    history: VecDeque<PhaseRecord>,
    current_phase: Phase,
    phase_start_ms: Option<i64>,
    phase_duration_secs: f64,
}

impl PhaseTracker {
    pub fn new(history_size: usize) -> Self {
        Self {
            history_size,
            history: VecDeque::new(),
            current_phase: Phase::Discovery,
            phase_start_ms: None,
            phase_duration_secs: 0.0,
        }
    }

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn history(&self) -> &VecDeque<PhaseRecord> {
        &self.history
    }

    pub fn update_phase(&mut self, new_phase: Phase, now_ms: i64) -> PhaseUpdate {
        let phase_changed = new_phase != self.current_phase;

        self.phase_duration_secs = match self.phase_start_ms {
            Some(start) => (now_ms - start) as f64 / 1000.0,
            None => 0.0,
        };

        let is_valid_transition = is_valid_transition(self.current_phase, new_phase);

        if phase_changed {
            self.history.push_back(PhaseRecord {
                phase: self.current_phase,
                entered_at_ms: self.phase_start_ms.unwrap_or(now_ms),
                duration_secs: self.phase_duration_secs,
            });
            while self.history.len() > self.history_size {
                self.history.pop_front();
            }

            self.current_phase = new_phase;
            self.phase_start_ms = Some(now_ms);
        }

        let phase_confidence = self.calculate_phase_confidence();

        PhaseUpdate {
            phase: self.current_phase,
            phase_changed,
            phase_duration_secs: self.phase_duration_secs,
            is_valid_transition,
            phase_confidence,
        }
    }

    fn calculate_phase_confidence(&self) -> f64 {
        if self.history.len() < 2 {
            return 0.5;
        }

        let mut valid = 0usize;
        let mut total = 0usize;
        for pair in self.history.iter().collect::<Vec<_>>().windows(2) {
            if is_valid_transition(pair[0].phase, pair[1].phase) {
                valid += 1;
            }
            total += 1;
        }
        if total == 0 {
            return 0.5;
        }

        let mut confidence = valid as f64 / total as f64;
        if self.phase_duration_secs > CONFIDENCE_DURATION_BONUS_SECS {
            confidence += CONFIDENCE_DURATION_BONUS;
        }
        confidence.min(1.0)
    }

    pub fn expected_next_phases(&self) -> &'static [Phase] {
        expected_next_phases(self.current_phase)
    }

    /// Whether the last 6 history entries (plus the current phase) contain
    /// a full discovery/manipulation/execution/distribution cycle.
    pub fn is_in_cycle(&self) -> bool {
        if self.history.len() < 4 {
            return false;
        }
        let recent: std::collections::HashSet<Phase> =
            self.history.iter().rev().take(6).map(|r| r.phase).collect();
        recent.contains(&Phase::Discovery)
            && recent.contains(&Phase::Manipulation)
            && recent.contains(&Phase::Execution)
            && recent.contains(&Phase::Distribution)
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

/// Permits two shortcuts beyond the canonical cycle: discovery straight to
/// execution, and manipulation straight to distribution.
fn is_valid_transition(from: Phase, to: Phase) -> bool {
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Phase::Discovery, Phase::Manipulation)
            | (Phase::Discovery, Phase::Execution)
            | (Phase::Manipulation, Phase::Execution)
            | (Phase::Manipulation, Phase::Distribution)
            | (Phase::Execution, Phase::Distribution)
            | (Phase::Distribution, Phase::Discovery)
    )
}

fn expected_next_phases(current: Phase) -> &'static [Phase] {
    match current {
        Phase::Discovery => &[Phase::Manipulation, Phase::Execution],
        Phase::Manipulation => &[Phase::Execution],
        Phase::Execution => &[Phase::Distribution],
        Phase::Distribution => &[Phase::Discovery],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staying_in_phase_does_not_push_history() {
        let mut tracker = PhaseTracker::default();
        tracker.update_phase(Phase::Discovery, 0);
        tracker.update_phase(Phase::Discovery, 1_000);
        assert!(tracker.history().is_empty());
    }

    #[test]
    fn canonical_transition_is_valid_and_recorded() {
        let mut tracker = PhaseTracker::default();
        let update = tracker.update_phase(Phase::Manipulation, 10_000);
        assert!(update.phase_changed);
        assert!(update.is_valid_transition);
        assert_eq!(tracker.history().len(), 1);
    }

    #[test]
    fn skipping_straight_from_discovery_to_distribution_is_invalid() {
        let mut tracker = PhaseTracker::default();
        let update = tracker.update_phase(Phase::Distribution, 10_000);
        assert!(!update.is_valid_transition);
    }

    #[test]
    fn long_lived_phase_gets_a_confidence_bonus() {
        let mut tracker = PhaseTracker::default();
        tracker.update_phase(Phase::Manipulation, 0);
        tracker.update_phase(Phase::Execution, 5_000);
        let update = tracker.update_phase(Phase::Distribution, 70_000);
        assert!(update.phase_confidence >= 0.2);
    }
}
