//! Market-phase classification: discovery, manipulation, execution, distribution.

use crate::models::{BookSide, Phase};
use crate::svd::absorption::AbsorptionReport;
use crate::svd::intent::{Intent, IntentReport};
use crate::svd::spoof::SpoofWall;

const EXECUTION_VELOCITY_THRESHOLD: f64 = 20.0;

pub fn determine_phase(
    absorption: &AbsorptionReport,
    velocity: f64,
    spoof: &SpoofWall,
    spoof_confirmed: bool,
    intent: &IntentReport,
    dom_side: Option<BookSide>,
) -> Phase {
    if absorption.absorbing || velocity > EXECUTION_VELOCITY_THRESHOLD {
        return Phase::Execution;
    }

    if spoof.side.is_some() || spoof_confirmed {
        return Phase::Manipulation;
    }

    let dom_aligned = matches!(
        (intent.intent, dom_side),
        (Intent::Accumulating, Some(BookSide::Bid)) | (Intent::Distributing, Some(BookSide::Ask))
    );
    if intent.intent != Intent::Unclear && dom_aligned {
        return Phase::Distribution;
    }

    Phase::Discovery
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent_report(intent: Intent) -> IntentReport {
        IntentReport { intent, reversal_detected: false, cvd_confirms_intent: false, is_pullback_or_bounce: false }
    }

    #[test]
    fn absorption_forces_execution() {
        let absorption = AbsorptionReport { absorbing: true, side: None };
        let phase = determine_phase(&absorption, 0.0, &SpoofWall::default(), false, &intent_report(Intent::Unclear), None);
        assert_eq!(phase, Phase::Execution);
    }

    #[test]
    fn spoof_forces_manipulation_when_no_execution() {
        let absorption = AbsorptionReport::default();
        let spoof = SpoofWall { side: Some(BookSide::Ask), price: Some(100.0), volume: Some(10.0), factor: 5.0 };
        let phase = determine_phase(&absorption, 0.0, &spoof, false, &intent_report(Intent::Unclear), None);
        assert_eq!(phase, Phase::Manipulation);
    }

    #[test]
    fn aligned_clear_intent_yields_distribution() {
        let absorption = AbsorptionReport::default();
        let phase = determine_phase(
            &absorption,
            0.0,
            &SpoofWall::default(),
            false,
            &intent_report(Intent::Accumulating),
            Some(BookSide::Bid),
        );
        assert_eq!(phase, Phase::Distribution);
    }

    #[test]
    fn nothing_conclusive_defaults_to_discovery() {
        let absorption = AbsorptionReport::default();
        let phase = determine_phase(&absorption, 0.0, &SpoofWall::default(), false, &intent_report(Intent::Unclear), None);
        assert_eq!(phase, Phase::Discovery);
    }
}
