//! Smart-money intent: accumulating, distributing, or unclear.

use crate::models::{BookSide, Phase};
use crate::svd::aggression::AggressionReport;
use crate::svd::cvd::CvdReport;

const CVD_SIGNIFICANT: f64 = 5.0;
const REVERSAL_SLOPE_THRESHOLD: f64 = 1.5;
const SLOPE_SIGNIFICANT: f64 = 0.5;
const EXECUTION_SLOPE_OVERRIDE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Accumulating,
    Distributing,
    Unclear,
}

#[derive(Debug, Clone, Copy)]
pub struct IntentReport {
    pub intent: Intent,
    pub reversal_detected: bool,
    pub cvd_confirms_intent: bool,
    pub is_pullback_or_bounce: bool,
}

pub fn determine_intent(
    cvd: &CvdReport,
    aggression: &AggressionReport,
    snapshot_delta: f64,
    phase: Phase,
    dom_side: Option<BookSide>,
) -> IntentReport {
    let mut reversal_detected = false;

    let mut intent = if cvd.cvd.abs() > CVD_SIGNIFICANT && cvd.cvd_slope.abs() > REVERSAL_SLOPE_THRESHOLD {
        let opposite_sign = (cvd.cvd < 0.0 && cvd.cvd_slope > 0.0) || (cvd.cvd > 0.0 && cvd.cvd_slope < 0.0);
        if opposite_sign {
            reversal_detected = true;
            if cvd.cvd < 0.0 {
                Intent::Accumulating
            } else {
                Intent::Distributing
            }
        } else if cvd.cvd > 0.0 {
            Intent::Accumulating
        } else {
            Intent::Distributing
        }
    } else if cvd.cvd.abs() > CVD_SIGNIFICANT {
        if cvd.cvd > 0.0 { Intent::Accumulating } else { Intent::Distributing }
    } else if cvd.cvd_slope.abs() > SLOPE_SIGNIFICANT {
        if cvd.cvd_slope > 0.0 { Intent::Accumulating } else { Intent::Distributing }
    } else if snapshot_delta < 0.0 && aggression.sell_aggression > aggression.buy_aggression {
        Intent::Distributing
    } else if snapshot_delta > 0.0 && aggression.buy_aggression > aggression.sell_aggression {
        Intent::Accumulating
    } else {
        Intent::Unclear
    };

    if phase == Phase::Execution {
        if cvd.cvd_slope > EXECUTION_SLOPE_OVERRIDE {
            intent = Intent::Accumulating;
        } else if cvd.cvd_slope < -EXECUTION_SLOPE_OVERRIDE {
            intent = Intent::Distributing;
        }
    }

    let dom_aligned = matches!(
        (intent, dom_side),
        (Intent::Accumulating, Some(BookSide::Bid)) | (Intent::Distributing, Some(BookSide::Ask))
    );
    let _ = dom_aligned;

    let cvd_confirms_intent = matches!(
        (intent, cvd.cvd > 0.0),
        (Intent::Accumulating, true) | (Intent::Distributing, false)
    );

    let is_pullback_or_bounce = cvd_confirms_intent
        && matches!(
            (intent, cvd.cvd_slope > 0.0),
            (Intent::Accumulating, false) | (Intent::Distributing, true)
        );

    IntentReport { intent, reversal_detected, cvd_confirms_intent, is_pullback_or_bounce }
}
