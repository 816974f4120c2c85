//! Final decision: blends liquidity, SVD, structure, and technical votes
//! into a direction, scores confidence, and assembles the signal record.
//!
//! Grounded in `modules/decision/decision_engine.py`. The min-confidence gate
//! uses the configuration table's `min_confidence_to_trade` (default 4.0)
//! rather than the distilled source's standalone `risk_filters.py`, which
//! hardcodes 2.0 — see DESIGN.md.

pub mod conflict;

use crate::behavior::BehaviorRecord;
use crate::liquidity::volume_profile::{PocRole, ValueAreaPosition};
use crate::liquidity::LiquidityReport;
use crate::models::{BookSide, Direction, Levels, LevelType, Scenario, SignalDirection, SignalRecord};
use crate::structure::{MarketStructure, Trend};
use crate::svd::intent::Intent;
use crate::svd::SvdReport;
use crate::technical::{TaTrend, TechnicalReport};
use crate::trap::TrapReport;
use conflict::{ConflictDetector, ConflictInputs, ConflictReport};

const SVD_VETO_CONFIDENCE: f64 = 3.0;
const VOTE_MARGIN_THRESHOLD: f64 = 1.0;
const TRAP_STRONG_THRESHOLD: f64 = 4.0;
const HTF_ALIGN_BONUS: f64 = 0.5;
const CONTRADICTION_PENALTY: f64 = 1.5;
const DATA_QUALITY_BASELINE: f64 = 0.8;

/// Pre-computed higher-timeframe bias, fed in from outside the hard core.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtfContext {
    pub htf1_trend: Option<Trend>,
    pub htf2_trend: Option<Trend>,
}

pub struct DecisionEngine {
    conflict_detector: ConflictDetector,
    min_confidence_to_trade: f64,
    execution_only_signals: bool,
}

impl DecisionEngine {
    pub fn new(critical_conflict_threshold: usize, min_confidence_to_trade: f64, execution_only_signals: bool) -> Self {
        Self {
            conflict_detector: ConflictDetector::new(critical_conflict_threshold),
            min_confidence_to_trade,
            execution_only_signals,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn analyze(
        &self,
        liquidity: &LiquidityReport,
        svd: &SvdReport,
        structure: &MarketStructure,
        technical: &TechnicalReport,
        trap: &TrapReport,
        behavior: &BehaviorRecord,
        current_price: f64,
        htf: Option<&HtfContext>,
        overall_quality: f64,
    ) -> SignalRecord {
        let votes = Votes::collect(liquidity, svd, structure, technical);
        let mut direction = votes.decide();

        if svd.confidence > SVD_VETO_CONFIDENCE {
            if svd.intent.intent == Intent::Distributing && direction == SignalDirection::Buy {
                direction = SignalDirection::Wait;
            }
            if svd.intent.intent == Intent::Accumulating && direction == SignalDirection::Sell {
                direction = SignalDirection::Wait;
            }
        }

        let conflict_inputs = ConflictInputs {
            liquidity_direction: liquidity.direction.direction,
            svd_intent: svd.intent.intent,
            svd_phase_is_execution_or_distribution: matches!(svd.phase, crate::models::Phase::Execution | crate::models::Phase::Distribution),
            structure_trend: structure.trend,
            ta_trend: technical.trend,
            signal: direction,
            dom_side: svd.dom_imbalance.side,
            thin_above: svd.thin_zones.thin_above.is_some(),
            thin_below: svd.thin_zones.thin_below.is_some(),
            htf1_trend: htf.and_then(|h| h.htf1_trend),
        };
        let conflicts = self.conflict_detector.detect_conflicts(&conflict_inputs);

        let mut confidence = self.calculate_confidence(&votes, direction, liquidity, svd, structure, technical, trap, behavior, htf, overall_quality);

        let is_strong_trap = trap.is_trap && trap.trap_score >= TRAP_STRONG_THRESHOLD;

        if self.conflict_detector.should_force_wait(&conflicts) && !is_strong_trap {
            return wait_record(conflicts, trap.clone(), behavior.clone(), "blocked by critical cross-module conflicts".to_string());
        }
        if is_strong_trap {
            confidence += trap.trap_score * 0.5;
        }

        if self.execution_only_signals && svd.phase != crate::models::Phase::Execution && confidence < 6.0 {
            return wait_record(conflicts, trap.clone(), behavior.clone(), "waiting for execution phase confirmation".to_string());
        }

        if confidence < self.min_confidence_to_trade {
            direction = SignalDirection::Wait;
        }

        let levels = compute_levels(liquidity, structure, direction, current_price);
        let explanation = build_explanation(direction, confidence, &votes, svd, liquidity, &levels);
        let scenario = build_scenario(direction, &explanation);

        SignalRecord { direction, confidence: confidence.clamp(0.0, 10.0), explanation, scenario, levels, conflicts, trap: trap.clone(), behavior: behavior.clone() }
    }

    #[allow(clippy::too_many_arguments)]
    fn calculate_confidence(
        &self,
        votes: &Votes,
        direction: SignalDirection,
        liquidity: &LiquidityReport,
        svd: &SvdReport,
        structure: &MarketStructure,
        technical: &TechnicalReport,
        trap: &TrapReport,
        behavior: &BehaviorRecord,
        htf: Option<&HtfContext>,
        overall_quality: f64,
    ) -> f64 {
        if direction == SignalDirection::Wait {
            return 0.0;
        }

        let agreement = votes.agreement_count(direction);
        let mut base = (agreement as f64 * 1.5).min(6.0);

        if let Some(ctx) = htf {
            if let Some(htf1) = ctx.htf1_trend {
                base += if trend_matches_signal(htf1, direction) {
                    HTF_ALIGN_BONUS
                } else if trend_opposes_signal(htf1, direction) {
                    -HTF_ALIGN_BONUS
                } else {
                    0.0
                };
            }
        }

        let reversal_setup = svd.intent.reversal_detected
            && svd.phase == crate::models::Phase::Execution
            && (technical.rsi < 25.0 || technical.rsi > 75.0 || liquidity.sweep.post_reversal);

        if !reversal_setup {
            let contradictions = votes.contradiction_count();
            base -= contradictions as f64 * CONTRADICTION_PENALTY;
        }

        base += match svd.phase {
            crate::models::Phase::Execution => 0.5,
            crate::models::Phase::Distribution => 0.2,
            crate::models::Phase::Manipulation => -0.5,
            crate::models::Phase::Discovery => 0.0,
        };

        if svd.intent.cvd_confirms_intent {
            base += 0.4;
        }
        if svd.cvd.divergence {
            base -= 0.3;
        }
        if svd.intent.reversal_detected {
            base += 1.5;
        }

        let rsi_distance = (technical.rsi - 50.0).abs();
        base += if rsi_distance >= 25.0 {
            1.5
        } else if rsi_distance >= 20.0 {
            1.0
        } else {
            0.0
        };

        if svd.fomo_panic.strong_fomo || svd.fomo_panic.strong_panic {
            base -= 0.3;
        } else if svd.fomo_panic.fomo || svd.fomo_panic.panic {
            base -= 0.2;
        }

        if svd.spoof_confirmed {
            let against = matches!(
                (svd.spoof_wall.side, direction),
                (Some(BookSide::Ask), SignalDirection::Buy) | (Some(BookSide::Bid), SignalDirection::Sell)
            );
            let aligned = matches!(
                (svd.spoof_wall.side, direction),
                (Some(BookSide::Ask), SignalDirection::Sell) | (Some(BookSide::Bid), SignalDirection::Buy)
            );
            if against {
                base -= 0.3;
            } else if aligned {
                base += 0.1;
            }
        }

        let sweep = &liquidity.sweep;
        if (sweep.sweep_up && direction == SignalDirection::Buy) || (sweep.sweep_down && direction == SignalDirection::Sell) {
            base += 0.3;
        }
        if (sweep.hit_liquidity_above && direction == SignalDirection::Buy) || (sweep.hit_liquidity_below && direction == SignalDirection::Sell) {
            base += 0.2;
        }
        if sweep.post_reversal {
            base += 0.2;
        }

        let breakout = if direction == SignalDirection::Buy { &liquidity.breakout_up } else { &liquidity.breakout_down };
        if breakout.strong_breakout {
            base += 1.0;
        } else if breakout.weak_breakout {
            base += 0.5;
        }

        if overall_quality < DATA_QUALITY_BASELINE {
            base -= (DATA_QUALITY_BASELINE - overall_quality) * 5.0;
        }

        base += value_area_bonus(liquidity.va_position, direction);
        if liquidity.poc_info.near_poc && liquidity.poc_info.acts_as == PocRole::Magnet {
            base -= 0.2;
        }
        if (liquidity.poc_info.acts_as == PocRole::Support && direction == SignalDirection::Buy)
            || (liquidity.poc_info.acts_as == PocRole::Resistance && direction == SignalDirection::Sell)
        {
            base += 0.2;
        }

        base += path_resistance_bonus(liquidity, svd, direction);

        let module_avg = (svd.confidence + trap.trap_score + behavior.behavior_score) / 3.0;
        0.6 * module_avg + 0.4 * base
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(2, 4.0, false)
    }
}

fn wait_record(conflicts: ConflictReport, trap: TrapReport, behavior: BehaviorRecord, reason: String) -> SignalRecord {
    SignalRecord {
        direction: SignalDirection::Wait,
        confidence: 0.0,
        explanation: reason,
        scenario: Scenario { main: "wait".to_string(), alternative: String::new() },
        levels: Levels::default(),
        conflicts,
        trap,
        behavior,
    }
}

struct Votes {
    buy: f64,
    sell: f64,
    svd_side: Option<SignalDirection>,
    liquidity_side: Option<SignalDirection>,
    structure_side: Option<SignalDirection>,
    technical_side: Option<SignalDirection>,
}

impl Votes {
    fn collect(liquidity: &LiquidityReport, svd: &SvdReport, structure: &MarketStructure, technical: &TechnicalReport) -> Self {
        let svd_weight = if svd.intent.cvd_confirms_intent { 3.0 } else { 2.5 };
        let svd_side = match svd.intent.intent {
            Intent::Accumulating => Some(SignalDirection::Buy),
            Intent::Distributing => Some(SignalDirection::Sell),
            Intent::Unclear => None,
        };
        let liquidity_side = match liquidity.direction.direction {
            Direction::Up => Some(SignalDirection::Buy),
            Direction::Down => Some(SignalDirection::Sell),
            Direction::Neutral => None,
        };
        let structure_side = match structure.trend {
            Trend::Bullish => Some(SignalDirection::Buy),
            Trend::Bearish => Some(SignalDirection::Sell),
            Trend::Range | Trend::Unknown => None,
        };
        let technical_side = match technical.trend {
            TaTrend::Bullish => Some(SignalDirection::Buy),
            TaTrend::Bearish => Some(SignalDirection::Sell),
            TaTrend::Neutral => None,
        };

        let mut buy = 0.0;
        let mut sell = 0.0;
        for (side, weight) in [(svd_side, svd_weight), (liquidity_side, 2.0), (structure_side, 1.0), (technical_side, 0.5)] {
            match side {
                Some(SignalDirection::Buy) => buy += weight,
                Some(SignalDirection::Sell) => sell += weight,
                _ => {}
            }
        }

        Self { buy, sell, svd_side, liquidity_side, structure_side, technical_side }
    }

    fn decide(&self) -> SignalDirection {
        let margin = (self.buy - self.sell).abs();
        if margin < VOTE_MARGIN_THRESHOLD {
            return SignalDirection::Wait;
        }
        if self.buy > self.sell { SignalDirection::Buy } else { SignalDirection::Sell }
    }

    fn agreement_count(&self, direction: SignalDirection) -> usize {
        [self.svd_side, self.liquidity_side, self.structure_side, self.technical_side]
            .iter()
            .filter(|side| **side == Some(direction))
            .count()
    }

    /// Pairwise disagreement between liquidity/SVD/structure, each pair
    /// counted once when both sides have an opinion and they differ.
    fn contradiction_count(&self) -> usize {
        let pairs = [
            (self.liquidity_side, self.svd_side),
            (self.liquidity_side, self.structure_side),
            (self.svd_side, self.structure_side),
        ];
        pairs.iter().filter(|(a, b)| matches!((a, b), (Some(x), Some(y)) if x != y)).count()
    }
}

fn trend_matches_signal(trend: Trend, direction: SignalDirection) -> bool {
    matches!((trend, direction), (Trend::Bullish, SignalDirection::Buy) | (Trend::Bearish, SignalDirection::Sell))
}

fn trend_opposes_signal(trend: Trend, direction: SignalDirection) -> bool {
    matches!((trend, direction), (Trend::Bullish, SignalDirection::Sell) | (Trend::Bearish, SignalDirection::Buy))
}

fn value_area_bonus(position: ValueAreaPosition, direction: SignalDirection) -> f64 {
    match (position, direction) {
        (ValueAreaPosition::BelowVal, SignalDirection::Buy) | (ValueAreaPosition::AboveVah, SignalDirection::Sell) => 0.3,
        (ValueAreaPosition::AboveVah, SignalDirection::Buy) | (ValueAreaPosition::BelowVal, SignalDirection::Sell) => -0.3,
        _ => 0.0,
    }
}

fn path_resistance_bonus(liquidity: &LiquidityReport, svd: &SvdReport, direction: SignalDirection) -> f64 {
    use std::cmp::Ordering;
    let path = svd.path_cost;
    match path.up.partial_cmp(&path.down).unwrap_or(Ordering::Equal) {
        Ordering::Equal => -0.1,
        Ordering::Less => {
            let mut bonus = if direction == SignalDirection::Buy { 0.3 } else { 0.0 };
            if direction == SignalDirection::Buy && liquidity.direction.direction == Direction::Up {
                bonus += 0.2;
            }
            bonus
        }
        Ordering::Greater => {
            let mut bonus = if direction == SignalDirection::Sell { 0.3 } else { 0.0 };
            if direction == SignalDirection::Sell && liquidity.direction.direction == Direction::Down {
                bonus += 0.2;
            }
            bonus
        }
    }
}

fn compute_levels(liquidity: &LiquidityReport, structure: &MarketStructure, direction: SignalDirection, current_price: f64) -> Levels {
    if direction == SignalDirection::Wait {
        return Levels::default();
    }

    let target_side = match direction {
        SignalDirection::Buy => LevelType::BuyStops,
        SignalDirection::Sell => LevelType::SellStops,
        SignalDirection::Wait => unreachable!(),
    };

    let mut candidates: Vec<f64> = liquidity
        .stop_clusters
        .iter()
        .chain(liquidity.swing_liquidity.iter())
        .filter(|l| l.level_type == target_side)
        .map(|l| l.price)
        .collect();

    if candidates.is_empty() {
        let swing_prices = match direction {
            SignalDirection::Buy => structure.swings.highs.iter().map(|s| s.price).collect::<Vec<_>>(),
            _ => structure.swings.lows.iter().map(|s| s.price).collect::<Vec<_>>(),
        };
        candidates = swing_prices;
    }

    if candidates.is_empty() {
        if let Some(ath_atl) = &liquidity.ath_atl {
            candidates.push(match direction {
                SignalDirection::Buy => ath_atl.ath.price,
                _ => ath_atl.atl.price,
            });
        }
    }

    candidates.sort_by(|a, b| {
        let da = (a - current_price).abs();
        let db = (b - current_price).abs();
        da.partial_cmp(&db).unwrap()
    });
    candidates.dedup();
    let targets: Vec<String> = candidates.into_iter().take(2).map(|p| format!("{p:.2}")).collect();

    let opposite_swing = match direction {
        SignalDirection::Buy => structure.swings.lows.last().map(|s| s.price),
        _ => structure.swings.highs.last().map(|s| s.price),
    };
    let entry_zone = match opposite_swing {
        Some(p) => Some(format!("{current_price:.2} (bracketed by {p:.2})")),
        None => Some(format!("{current_price:.2}")),
    };

    let invalidation_swing = match direction {
        SignalDirection::Buy => structure.swings.lows.last().map(|s| s.price),
        _ => structure.swings.highs.last().map(|s| s.price),
    };
    let invalidation = invalidation_swing.map(|p| {
        let scaled = match direction {
            SignalDirection::Buy => p * 0.998,
            _ => p * 1.002,
        };
        format!("{scaled:.2}")
    });

    Levels { entry_zone, targets, invalidation }
}

fn build_explanation(direction: SignalDirection, confidence: f64, votes: &Votes, svd: &SvdReport, liquidity: &LiquidityReport, levels: &Levels) -> String {
    if direction == SignalDirection::Wait {
        return "no side has a clear enough edge, staying out".to_string();
    }

    let mut parts = Vec::new();
    let headline = match direction {
        SignalDirection::Buy => "bullish setup",
        SignalDirection::Sell => "bearish setup",
        SignalDirection::Wait => unreachable!(),
    };
    parts.push(headline.to_string());

    parts.push(format!("agreement across {} module(s)", votes.agreement_count(direction)));
    parts.push(format!("SVD intent {:?} in {:?} phase", svd.intent.intent, svd.phase));
    parts.push(format!("liquidity direction {:?}", liquidity.direction.direction));
    if let Some(target) = levels.targets.first() {
        parts.push(format!("first target near {target}"));
    }
    parts.push(format!("confidence {confidence:.1}/10"));

    parts.join(", ")
}

fn build_scenario(direction: SignalDirection, explanation: &str) -> Scenario {
    let alternative = match direction {
        SignalDirection::Buy => "if price fails to hold, treat this as a failed breakout and stand aside".to_string(),
        SignalDirection::Sell => "if price reclaims the level, treat this as a failed breakdown and stand aside".to_string(),
        SignalDirection::Wait => String::new(),
    };
    Scenario { main: explanation.to_string(), alternative }
}
