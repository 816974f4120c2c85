//! Behavior analysis: reads crowd sentiment against whale action, and flags
//! when the two diverge.
//!
//! Grounded in `modules/behavior/behavior_engine.py`.

use crate::models::BookSide;
use crate::svd::intent::Intent;
use crate::svd::SvdReport;
use crate::trap::{TrapReport, TrapType};

const CROWD_TRAPPED_THRESHOLD: f64 = 3.0;
const WHALE_PHASE_EXECUTION_BONUS: f64 = 3.0;
const WHALE_PHASE_DISTRIBUTION_BONUS: f64 = 2.0;
const WHALE_PHASE_MANIPULATION_BONUS: f64 = 1.5;
const WHALE_ABSORPTION_BONUS: f64 = 1.5;
const WHALE_SPOOF_BONUS: f64 = 1.0;
const WHALE_CVD_CONFIRMS_BONUS: f64 = 1.5;
const WHALE_DOM_CONFIRMS_BONUS: f64 = 1.0;
const BEHAVIOR_TRAP_BONUS: f64 = 3.0;
const BEHAVIOR_WHALE_CONFIDENCE_WEIGHT: f64 = 0.4;
const BEHAVIOR_DIVERGENCE_BONUS: f64 = 2.0;
const BEHAVIOR_CVD_DIVERGENCE_BONUS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrowdSentiment {
    Fomo,
    Panic,
    Greedy,
    Fearful,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhaleAction {
    Accumulating,
    Distributing,
    Manipulating,
    Inactive,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BehaviorRecord {
    pub crowd_sentiment: CrowdSentiment,
    pub crowd_trapped: bool,
    pub whale_action: WhaleAction,
    pub whale_confidence: f64,
    pub crowd_whale_divergence: bool,
    pub behavior_score: f64,
    pub explanation: String,
}

pub struct BehaviorEngine;

impl BehaviorEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, svd: &SvdReport, trap: &TrapReport) -> BehaviorRecord {
        let crowd_sentiment = determine_crowd_sentiment(svd, trap.is_trap);
        let crowd_trapped = trap.is_trap && trap.trap_score >= CROWD_TRAPPED_THRESHOLD;
        let whale_action = determine_whale_action(svd);
        let whale_confidence = calculate_whale_confidence(svd);
        let crowd_whale_divergence = detect_divergence(crowd_sentiment, whale_action, trap.is_trap);
        let behavior_score = calculate_behavior_score(crowd_trapped, whale_confidence, crowd_whale_divergence, svd.cvd.divergence);
        let explanation = generate_explanation(crowd_sentiment, crowd_trapped, whale_action, whale_confidence, crowd_whale_divergence, trap.trap_type);

        BehaviorRecord {
            crowd_sentiment,
            crowd_trapped,
            whale_action,
            whale_confidence,
            crowd_whale_divergence,
            behavior_score,
            explanation,
        }
    }
}

impl Default for BehaviorEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn determine_crowd_sentiment(svd: &SvdReport, is_trap: bool) -> CrowdSentiment {
    if svd.fomo_panic.strong_fomo || (svd.fomo_panic.fomo && is_trap) {
        CrowdSentiment::Fomo
    } else if svd.fomo_panic.strong_panic || (svd.fomo_panic.panic && is_trap) {
        CrowdSentiment::Panic
    } else if svd.fomo_panic.fomo {
        CrowdSentiment::Greedy
    } else if svd.fomo_panic.panic {
        CrowdSentiment::Fearful
    } else {
        CrowdSentiment::Neutral
    }
}

fn determine_whale_action(svd: &SvdReport) -> WhaleAction {
    use crate::models::Phase;
    match svd.phase {
        Phase::Manipulation => WhaleAction::Manipulating,
        Phase::Execution => match svd.intent.intent {
            Intent::Accumulating => WhaleAction::Accumulating,
            Intent::Distributing => WhaleAction::Distributing,
            Intent::Unclear => WhaleAction::Inactive,
        },
        Phase::Distribution => WhaleAction::Distributing,
        Phase::Discovery => match svd.intent.intent {
            Intent::Accumulating => WhaleAction::Accumulating,
            Intent::Distributing => WhaleAction::Distributing,
            Intent::Unclear => WhaleAction::Inactive,
        },
    }
}

fn calculate_whale_confidence(svd: &SvdReport) -> f64 {
    use crate::models::Phase;
    let mut confidence = match svd.phase {
        Phase::Execution => WHALE_PHASE_EXECUTION_BONUS,
        Phase::Distribution => WHALE_PHASE_DISTRIBUTION_BONUS,
        Phase::Manipulation => WHALE_PHASE_MANIPULATION_BONUS,
        Phase::Discovery => 0.0,
    };

    if svd.absorption.absorbing {
        confidence += WHALE_ABSORPTION_BONUS;
    }
    if svd.spoof_confirmed {
        confidence += WHALE_SPOOF_BONUS;
    }
    if svd.intent.cvd_confirms_intent {
        confidence += WHALE_CVD_CONFIRMS_BONUS;
    }

    let dom_confirms = matches!(
        (svd.dom_imbalance.side, svd.intent.intent),
        (Some(BookSide::Bid), Intent::Accumulating) | (Some(BookSide::Ask), Intent::Distributing)
    );
    if dom_confirms {
        confidence += WHALE_DOM_CONFIRMS_BONUS;
    }

    confidence.min(10.0)
}

fn detect_divergence(crowd_sentiment: CrowdSentiment, whale_action: WhaleAction, is_trap: bool) -> bool {
    if matches!(crowd_sentiment, CrowdSentiment::Greedy | CrowdSentiment::Fomo) && whale_action == WhaleAction::Distributing {
        return true;
    }
    if matches!(crowd_sentiment, CrowdSentiment::Fearful | CrowdSentiment::Panic) && whale_action == WhaleAction::Accumulating {
        return true;
    }
    is_trap
}

fn calculate_behavior_score(crowd_trapped: bool, whale_confidence: f64, divergence: bool, cvd_divergence: bool) -> f64 {
    let mut score = 0.0;
    if crowd_trapped {
        score += BEHAVIOR_TRAP_BONUS;
    }
    score += whale_confidence * BEHAVIOR_WHALE_CONFIDENCE_WEIGHT;
    if divergence {
        score += BEHAVIOR_DIVERGENCE_BONUS;
    }
    if cvd_divergence {
        score += BEHAVIOR_CVD_DIVERGENCE_BONUS;
    }
    score.min(10.0)
}

fn generate_explanation(
    crowd_sentiment: CrowdSentiment,
    crowd_trapped: bool,
    whale_action: WhaleAction,
    whale_confidence: f64,
    divergence: bool,
    trap_type: Option<TrapType>,
) -> String {
    let mut parts = Vec::new();

    let sentiment_text = match crowd_sentiment {
        CrowdSentiment::Fomo => "crowd is in FOMO, buying aggressively",
        CrowdSentiment::Panic => "crowd is panicking",
        CrowdSentiment::Greedy => "crowd is greedy",
        CrowdSentiment::Fearful => "crowd is fearful",
        CrowdSentiment::Neutral => "crowd is neutral",
    };
    parts.push(format!("Crowd: {sentiment_text}"));

    let whale_text = match whale_action {
        WhaleAction::Accumulating => "whales are accumulating positions",
        WhaleAction::Distributing => "whales are distributing positions",
        WhaleAction::Manipulating => "whales are manipulating the market",
        WhaleAction::Inactive => "whales are inactive",
    };
    parts.push(format!("Whales: {whale_text} (confidence: {whale_confidence:.1}/10)"));

    if crowd_trapped {
        match trap_type {
            Some(TrapType::BullTrap) => parts.push("WARNING: bull trap forming".to_string()),
            Some(TrapType::BearTrap) => parts.push("WARNING: bear trap forming".to_string()),
            None => {}
        }
    }

    if divergence {
        parts.push("crowd and whales are moving in opposite directions".to_string());
    }

    parts.join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Phase;
    use crate::svd::cvd::CvdReport;
    use crate::svd::intent::IntentReport;
    use crate::svd::phase_tracker::PhaseUpdate;

    fn default_svd() -> SvdReport {
        SvdReport {
            delta: 0.0,
            delta_normalized: None,
            cvd: CvdReport::default(),
            absorption: Default::default(),
            aggression: Default::default(),
            velocity: 0.0,
            dom_imbalance: Default::default(),
            thin_zones: Default::default(),
            path_cost: Default::default(),
            spoof_wall: Default::default(),
            spoof_confirmed: false,
            dom_chasing: Default::default(),
            buckets: Default::default(),
            fomo_panic: Default::default(),
            intent: IntentReport { intent: Intent::Unclear, reversal_detected: false, cvd_confirms_intent: false, is_pullback_or_bounce: false },
            phase: Phase::Discovery,
            phase_update: PhaseUpdate { phase: Phase::Discovery, phase_changed: false, phase_duration_secs: 0.0, is_valid_transition: true, phase_confidence: 0.5 },
            confidence: 0.0,
        }
    }

    #[test]
    fn strong_fomo_with_distribution_signals_divergence() {
        let mut svd = default_svd();
        svd.fomo_panic.strong_fomo = true;
        svd.phase = Phase::Distribution;
        let trap = TrapReport::default();
        let engine = BehaviorEngine::new();
        let record = engine.analyze(&svd, &trap);
        assert_eq!(record.crowd_sentiment, CrowdSentiment::Fomo);
        assert_eq!(record.whale_action, WhaleAction::Distributing);
        assert!(record.crowd_whale_divergence);
    }

    #[test]
    fn trap_always_counts_as_divergence() {
        let svd = default_svd();
        let trap = TrapReport { is_trap: true, trap_type: Some(TrapType::BullTrap), trap_score: 4.0, trap_reasons: vec![], expected_reversal_direction: None };
        let engine = BehaviorEngine::new();
        let record = engine.analyze(&svd, &trap);
        assert!(record.crowd_trapped);
        assert!(record.crowd_whale_divergence);
    }

    #[test]
    fn quiet_market_is_neutral_and_inactive() {
        let svd = default_svd();
        let trap = TrapReport::default();
        let engine = BehaviorEngine::new();
        let record = engine.analyze(&svd, &trap);
        assert_eq!(record.crowd_sentiment, CrowdSentiment::Neutral);
        assert_eq!(record.whale_action, WhaleAction::Inactive);
        assert!(!record.crowd_whale_divergence);
    }
}
