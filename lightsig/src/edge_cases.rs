//! Interpretation hazards.
//!
//! Every known edge case is reported on every run, detected or not, in a
//! fixed order, so report templates can index them positionally.

use std::collections::BTreeMap;

use crate::config::EclipseConfig;
use crate::types::{
    DataQuality, EclipseOutput, EdgeCase, EdgeCaseCode, GatingMode, LightSignature, ProfileFlag,
    RayOutput, ValidityFlag,
};
use instrument::RayId;

/// Shine at or above this counts as a strong ray.
const STRONG_SHINE: f64 = 75.0;
/// Eclipse at or above this makes a strength expensive.
const EXPENSIVE_ECLIPSE: f64 = 62.5;
/// Presence Shine below this suppresses the truth detector.
const LOW_PRESENCE_SHINE: f64 = 50.0;
/// Strong rays needed alongside low Presence.
const TRUTH_DETECTOR_STRONG_RAYS: usize = 4;
/// Shine every ray must reach for a self-report to look perfect.
const PERFECT_SHINE: f64 = 80.0;
/// Top ray net energy above this with the runner-up below
/// [`POLARIZATION_RUNNER_UP`] is extreme polarization.
const POLARIZATION_TOP: f64 = 85.0;
const POLARIZATION_RUNNER_UP: f64 = 60.0;
/// Detected cases that make the whole profile ambiguous.
const AMBIGUITY_COUNT: usize = 3;

fn case(code: EdgeCaseCode, detected: bool, restriction: &str, evidence: &str) -> EdgeCase {
    EdgeCase {
        code,
        detected,
        restriction: if detected { restriction.to_string() } else { String::new() },
        required_next_evidence: if detected { evidence.to_string() } else { String::new() },
    }
}

/// Detect all edge cases for a run.
pub fn detect(
    rays: &BTreeMap<RayId, RayOutput>,
    signature: &LightSignature,
    eclipse: &EclipseOutput,
    quality: &DataQuality,
    config: &EclipseConfig,
) -> Vec<EdgeCase> {
    let top: Vec<&RayOutput> = signature
        .top_two
        .iter()
        .filter_map(|r| rays.get(&r.ray_id))
        .collect();

    let expensive_strength = top
        .iter()
        .any(|r| r.score >= STRONG_SHINE && r.eclipse_score >= EXPENSIVE_ECLIPSE);

    let truth_suppressed = rays.get(&RayId::R3).is_some_and(|presence| {
        let strong_others = rays
            .values()
            .filter(|r| r.ray_id != RayId::R3 && r.score >= STRONG_SHINE)
            .count();
        presence.score < LOW_PRESENCE_SHINE && strong_others >= TRUTH_DETECTOR_STRONG_RAYS
    });

    let perfect_self_report = quality.has_flag(ValidityFlag::SocialDesirability)
        && !rays.is_empty()
        && rays.values().all(|r| r.score >= PERFECT_SHINE);

    let contradictory = quality.has_flag(ValidityFlag::Inconsistency);

    let partial = quality.has_flag(ValidityFlag::Partial);

    let [first, second] = &signature.top_two;
    let polarized = first.net_energy > POLARIZATION_TOP && second.net_energy < POLARIZATION_RUNNER_UP;

    let high_load = eclipse.gating.mode == GatingMode::Stabilize
        && (quality.sd_elevated()
            || contradictory
            || eclipse.derived_metrics.eer < config.burnout_eer);

    let mut cases = vec![
        case(
            EdgeCaseCode::ExpensiveStrength,
            expensive_strength,
            "Add cost language to the Top Two description. This strength is real but expensive under load.",
            "Retest after load reduction to see if eclipse drops while shine holds.",
        ),
        case(
            EdgeCaseCode::TruthDetectorSuppressed,
            truth_suppressed,
            "Flag Presence as priority regardless of net energy. Other ray scores may be inflated without grounding.",
            "Coach debrief focused on Presence access and body awareness.",
        ),
        case(
            EdgeCaseCode::PerfectSelfReport,
            perfect_self_report,
            "Suppress archetype language. Use hypothesis framing only. Recommend mini-interview.",
            "Mini-interview or 360 feedback to validate self-report.",
        ),
        case(
            EdgeCaseCode::ContradictoryResponses,
            contradictory,
            "Use directional language. Note that response patterns suggest context-specific differences.",
            "Retest or coach debrief to explore Work vs Life splits.",
        ),
        case(
            EdgeCaseCode::FlatProfile,
            signature.flat_profile,
            "Suppress the archetype. Report an undifferentiated profile with directional language.",
            "Retest after intentional reflection, or coach debrief to explore priorities.",
        ),
        case(
            EdgeCaseCode::CloseCall,
            signature.close_call,
            "Rankings near the top or bottom are nearly tied. Present the neighbouring ray as a close alternative.",
            "Retest or debrief to confirm which ray leads.",
        ),
        case(
            EdgeCaseCode::PartialCompletion,
            partial,
            "Label results as preliminary. Suppress specific predictions and recommend completion.",
            "Complete the full assessment.",
        ),
        case(
            EdgeCaseCode::ExtremePolarization,
            polarized,
            "Note single-ray dominance. The second ray may not be a true strength, so use directional language.",
            "Retest or debrief to confirm whether the second ray is genuinely resourced.",
        ),
        case(
            EdgeCaseCode::HighLoadInterference,
            high_load,
            "Eclipse may be amplifying noise. Prioritize stabilization tools before interpreting patterns.",
            "Retest after 4-6 weeks of stabilization tools.",
        ),
    ];

    let detected = cases.iter().filter(|c| c.detected).count();
    cases.push(case(
        EdgeCaseCode::UnresolvedAmbiguity,
        detected >= AMBIGUITY_COUNT,
        "Multiple conflicting signals. Use preliminary framing for all outputs and recommend a coach debrief.",
        "45-minute coach debrief to resolve ambiguity.",
    ));

    cases
}

/// Overall profile flag.
pub fn profile_flag(signature: &LightSignature, quality: &DataQuality) -> ProfileFlag {
    if quality.has_flag(ValidityFlag::Partial) {
        ProfileFlag::Partial
    } else if signature.flat_profile {
        ProfileFlag::Undifferentiated
    } else {
        ProfileFlag::Standard
    }
}
