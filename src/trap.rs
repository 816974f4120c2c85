//! Trap detection: crowd piled into a move the order flow says the other
//! side of the market is about to reverse.
//!
//! Grounded in `modules/trap/trap_engine.py`. `ta_data` is accepted by that
//! module's `analyze` but never read in its body, so it has no counterpart
//! here.

use crate::liquidity::LiquidityReport;
use crate::models::{BookSide, Direction, Phase, SignalDirection};
use crate::svd::intent::Intent;
use crate::svd::SvdReport;

const DEFAULT_TRAP_SCORE_THRESHOLD: f64 = 3.0;
const SIGNAL_REVERSAL_SCORE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapType {
    BullTrap,
    BearTrap,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TrapReport {
    pub is_trap: bool,
    #[serde(skip)]
    pub trap_type: Option<TrapType>,
    pub trap_score: f64,
    pub trap_reasons: Vec<String>,
    pub expected_reversal_direction: Option<Direction>,
}

pub struct TrapEngine {
    trap_score_threshold: f64,
}

impl TrapEngine {
    pub fn new(trap_score_threshold: f64) -> Self {
        Self { trap_score_threshold }
    }

    pub fn analyze(&self, svd: &SvdReport, liquidity: &LiquidityReport) -> TrapReport {
        let mut score = 0.0;
        let mut reasons = Vec::new();
        let mut trap_type = None;
        let mut expected_reversal = None;

        let liq_dir = liquidity.direction.direction;
        let sweep = &liquidity.sweep;
        let thin = &svd.thin_zones;

        let mut mark = |amount: f64, reason: &str, kind: TrapType, reversal: Direction| {
            score += amount;
            reasons.push(reason.to_string());
            trap_type = Some(kind);
            expected_reversal = Some(reversal);
        };

        if (svd.fomo_panic.fomo || svd.fomo_panic.strong_fomo) && svd.intent.intent == Intent::Distributing {
            mark(2.0, "crowd is chasing in FOMO while order flow is distributing", TrapType::BullTrap, Direction::Down);
        }
        if liq_dir == Direction::Up && svd.cvd.divergence && svd.cvd.cvd_slope < 0.0 {
            mark(1.5, "liquidity points up but CVD diverges weak", TrapType::BullTrap, Direction::Down);
        }
        if svd.spoof_confirmed && svd.spoof_wall.side == Some(BookSide::Bid) && svd.absorption.absorbing && svd.absorption.side == Some(BookSide::Ask) {
            mark(1.5, "bid spoof vanished and sell-side absorption began", TrapType::BullTrap, Direction::Down);
        }
        if svd.phase == Phase::Distribution && svd.dom_imbalance.side == Some(BookSide::Ask) && liq_dir == Direction::Up {
            mark(1.0, "distribution phase with ask-heavy book while price still holds up", TrapType::BullTrap, Direction::Down);
        }
        if sweep.sweep_up && thin.thin_below.is_some() {
            mark(1.0, "upside sweep collected stops over thin liquidity below", TrapType::BullTrap, Direction::Down);
        }

        if (svd.fomo_panic.panic || svd.fomo_panic.strong_panic) && svd.intent.intent == Intent::Accumulating {
            mark(2.0, "crowd is panicking while order flow is accumulating", TrapType::BearTrap, Direction::Up);
        }
        if liq_dir == Direction::Down && svd.cvd.divergence && svd.cvd.cvd_slope > 0.0 {
            mark(1.5, "liquidity points down but CVD diverges strong", TrapType::BearTrap, Direction::Up);
        }
        if svd.spoof_confirmed && svd.spoof_wall.side == Some(BookSide::Ask) && svd.absorption.absorbing && svd.absorption.side == Some(BookSide::Bid) {
            mark(1.5, "ask spoof vanished and buy-side absorption began", TrapType::BearTrap, Direction::Up);
        }
        if matches!(svd.phase, Phase::Discovery | Phase::Manipulation) && svd.dom_imbalance.side == Some(BookSide::Bid) && liq_dir == Direction::Down {
            mark(1.0, "bid-heavy book while price still falls, hidden accumulation", TrapType::BearTrap, Direction::Up);
        }
        if sweep.sweep_down && thin.thin_above.is_some() {
            mark(1.0, "downside sweep collected stops over thin liquidity above", TrapType::BearTrap, Direction::Up);
        }

        let is_trap = score >= self.trap_score_threshold;

        TrapReport {
            is_trap,
            trap_type,
            trap_score: score.min(10.0),
            trap_reasons: reasons,
            expected_reversal_direction: expected_reversal,
        }
    }

    pub fn signal_adjustment(&self, trap: &TrapReport, current_signal: SignalDirection) -> SignalAdjustment {
        if !trap.is_trap {
            return SignalAdjustment { adjusted_signal: current_signal, confidence_adjustment: 0.0, reason: "no trap detected".to_string() };
        }

        match (trap.trap_type, current_signal) {
            (Some(TrapType::BullTrap), SignalDirection::Buy) => {
                if trap.trap_score >= SIGNAL_REVERSAL_SCORE {
                    SignalAdjustment { adjusted_signal: SignalDirection::Sell, confidence_adjustment: -3.0, reason: format!("bull trap (score {:.1}) reverses BUY to SELL", trap.trap_score) }
                } else {
                    SignalAdjustment { adjusted_signal: SignalDirection::Wait, confidence_adjustment: -5.0, reason: format!("bull trap (score {:.1}) blocks BUY", trap.trap_score) }
                }
            }
            (Some(TrapType::BullTrap), SignalDirection::Sell) => {
                SignalAdjustment { adjusted_signal: SignalDirection::Sell, confidence_adjustment: 1.5, reason: format!("bull trap confirms SELL (score {:.1})", trap.trap_score) }
            }
            (Some(TrapType::BearTrap), SignalDirection::Sell) => {
                if trap.trap_score >= SIGNAL_REVERSAL_SCORE {
                    SignalAdjustment { adjusted_signal: SignalDirection::Buy, confidence_adjustment: -3.0, reason: format!("bear trap (score {:.1}) reverses SELL to BUY", trap.trap_score) }
                } else {
                    SignalAdjustment { adjusted_signal: SignalDirection::Wait, confidence_adjustment: -5.0, reason: format!("bear trap (score {:.1}) blocks SELL", trap.trap_score) }
                }
            }
            (Some(TrapType::BearTrap), SignalDirection::Buy) => {
                SignalAdjustment { adjusted_signal: SignalDirection::Buy, confidence_adjustment: 1.5, reason: format!("bear trap confirms BUY (score {:.1})", trap.trap_score) }
            }
            _ => SignalAdjustment { adjusted_signal: current_signal, confidence_adjustment: 0.0, reason: "trap does not affect this signal".to_string() },
        }
    }
}

impl Default for TrapEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TRAP_SCORE_THRESHOLD)
    }
}

#[derive(Debug, Clone)]
pub struct SignalAdjustment {
    pub adjusted_signal: SignalDirection,
    pub confidence_adjustment: f64,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liquidity::LiquidityReport;
    use crate::svd::SvdReport;

    fn default_svd() -> SvdReport {
        SvdReport {
            delta: 0.0,
            delta_normalized: None,
            cvd: crate::svd::cvd::CvdReport::default(),
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
            intent: crate::svd::intent::IntentReport {
                intent: Intent::Unclear,
                reversal_detected: false,
                cvd_confirms_intent: false,
                is_pullback_or_bounce: false,
            },
            phase: Phase::Discovery,
            phase_update: crate::svd::phase_tracker::PhaseUpdate {
                phase: Phase::Discovery,
                phase_changed: false,
                phase_duration_secs: 0.0,
                is_valid_transition: true,
                phase_confidence: 0.5,
            },
            confidence: 0.0,
        }
    }

    #[test]
    fn fomo_with_distributing_intent_flags_bull_trap() {
        let mut svd = default_svd();
        svd.fomo_panic.fomo = true;
        svd.intent.intent = Intent::Distributing;
        let engine = TrapEngine::default();
        let report = engine.analyze(&svd, &LiquidityReport::default());
        assert!(!report.is_trap);
        assert_eq!(report.trap_score, 2.0);
    }

    #[test]
    fn accumulating_score_reaches_threshold_with_two_reasons() {
        let mut svd = default_svd();
        svd.fomo_panic.panic = true;
        svd.intent.intent = Intent::Accumulating;
        svd.cvd.divergence = true;
        svd.cvd.cvd_slope = 0.5;
        let mut liquidity = LiquidityReport::default();
        liquidity.direction.direction = Direction::Down;
        let engine = TrapEngine::default();
        let report = engine.analyze(&svd, &liquidity);
        assert!(report.is_trap);
        assert_eq!(report.trap_type, Some(TrapType::BearTrap));
    }

    #[test]
    fn no_trap_leaves_signal_untouched() {
        let report = TrapReport::default();
        let engine = TrapEngine::default();
        let adjustment = engine.signal_adjustment(&report, SignalDirection::Buy);
        assert_eq!(adjustment.adjusted_signal, SignalDirection::Buy);
        assert_eq!(adjustment.confidence_adjustment, 0.0);
    }

    #[test]
    fn high_score_bull_trap_reverses_buy_to_sell() {
        let report = TrapReport { is_trap: true, trap_type: Some(TrapType::BullTrap), trap_score: 6.0, trap_reasons: vec![], expected_reversal_direction: Some(Direction::Down) };
        let engine = TrapEngine::default();
        let adjustment = engine.signal_adjustment(&report, SignalDirection::Buy);
        assert_eq!(adjustment.adjusted_signal, SignalDirection::Sell);
    }
}
