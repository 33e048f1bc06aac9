//! Executive signals.
//!
//! Twenty-four leadership signals, each banded from the rays and tools that
//! predict it. Rays contribute Access and tools contribute access, falling
//! back to usage; everything is read on the 0-4 scale.

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::ExecutiveConfig;
use crate::types::{
    DataQuality, ExecutiveSignal, GatingMode, RayOutput, SignalCategory, SignalLevel,
    ToolComposite, ValidityFlag,
};
use instrument::RayId::{self, *};
use instrument::Tool;

/// Static definition of a signal.
#[derive(Debug, Clone, Copy)]
pub struct SignalDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub category: SignalCategory,
    pub rays: &'static [RayId],
    pub tools: &'static [Tool],
    /// High capacity lowers the signal (risk signals)
    pub inverse: bool,
}

const fn core(
    id: &'static str,
    label: &'static str,
    rays: &'static [RayId],
    tools: &'static [Tool],
) -> SignalDefinition {
    SignalDefinition {
        id,
        label,
        category: SignalCategory::Core,
        rays,
        tools,
        inverse: false,
    }
}

const fn exec(
    id: &'static str,
    label: &'static str,
    rays: &'static [RayId],
    tools: &'static [Tool],
    inverse: bool,
) -> SignalDefinition {
    SignalDefinition {
        id,
        label,
        category: SignalCategory::Executive,
        rays,
        tools,
        inverse,
    }
}

/// The built-in signal table, `M001` through `M024`.
pub const SIGNALS: [SignalDefinition; 24] = [
    core("M001", "Daily Intentionality", &[R1], &[Tool::IfThenPlanning]),
    core("M002", "Time/Attention Architecture", &[R1, R3], &[Tool::IfThenPlanning, Tool::BoundaryOfLight]),
    core("M003", "Joy Access", &[R2], &[Tool::Reps]),
    core("M004", "Gratitude Practice", &[R2], &[Tool::Challenge143]),
    core("M005", "Attention Stability", &[R3], &[Tool::PresencePause]),
    core("M006", "Interoception", &[R3], &[Tool::NinetySecondWindow]),
    core("M007", "Fear Naming", &[R4], &[Tool::NinetySecondWindow]),
    core("M008", "Agency/Control Focus", &[R4, R1], &[Tool::IRise]),
    core("M009", "Values Clarity", &[R5], &[Tool::WatchMe]),
    core("M010", "Decision Alignment", &[R5, R1], &[Tool::IfThenPlanning]),
    core("M011", "Identity Coherence", &[R6], &[Tool::IRise]),
    core("M012", "Boundary Setting", &[R4, R6], &[Tool::BoundaryOfLight]),
    core("M013", "Attunement", &[R7], &[Tool::QuestionLoop]),
    core("M014", "Conversation Agility", &[R7, R3], &[Tool::QuestionLoop, Tool::PresencePause]),
    core("M015", "Openness", &[R8], &[Tool::WatchMe]),
    core("M016", "Opportunity Recognition", &[R8], &[Tool::RasReset]),
    core("M017", "Modeling", &[R9, R6], &[Tool::GoFirst]),
    core("M018", "Ripple Effect", &[R9, R7], &[Tool::Witness]),
    exec("M019", "Burnout Risk", &[R2, R3], &[Tool::RasReset], true),
    exec("M020", "Reliability Under Pressure", &[R1, R3, R4], &[Tool::NinetySecondWindow], false),
    exec("M021", "Decision Quality", &[R1, R5, R8], &[Tool::IfThenPlanning, Tool::QuestionLoop], false),
    exec("M022", "Psychological Safety", &[R6, R7, R9], &[Tool::QuestionLoop], false),
    exec("M023", "Engagement", &[R2, R5], &[Tool::Reps], false),
    exec("M024", "Leadership Readiness", &[R4, R5, R9], &[Tool::GoFirst], false),
];

/// Band a 0-4 base reading.
pub fn band(base: Option<f64>, config: &ExecutiveConfig) -> SignalLevel {
    match base {
        Some(x) if x >= config.high => SignalLevel::High,
        Some(x) if x >= config.elevated => SignalLevel::Elevated,
        Some(x) if x >= config.moderate => SignalLevel::Moderate,
        _ => SignalLevel::Low,
    }
}

fn base_reading(
    definition: &SignalDefinition,
    rays: &BTreeMap<RayId, RayOutput>,
    tools: &[ToolComposite],
) -> Option<f64> {
    let ray_values = definition
        .rays
        .iter()
        .filter_map(|id| rays.get(id))
        .map(|r| r.access_score / 25.0);
    let tool_values = definition.tools.iter().filter_map(|tool| {
        let id = tool.id();
        tools
            .iter()
            .find(|c| c.tool_id == id)
            .and_then(|c| c.access.or(c.usage))
    });

    let values: Vec<f64> = ray_values.chain(tool_values).collect();
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(if definition.inverse { 4.0 - mean } else { mean })
}

/// Derive every executive signal for a run.
pub fn derive_signals(
    rays: &BTreeMap<RayId, RayOutput>,
    tools: &[ToolComposite],
    gating: GatingMode,
    quality: &DataQuality,
    config: &ExecutiveConfig,
) -> Vec<ExecutiveSignal> {
    let mut moderators = Vec::new();
    if quality.sd_elevated() {
        moderators.push("Social desirability elevated; scores may be inflated".to_string());
    }
    if quality.has_flag(ValidityFlag::Inconsistency) {
        moderators.push("Inconsistency detected".to_string());
    }

    let signals: Vec<ExecutiveSignal> = SIGNALS
        .iter()
        .map(|definition| {
            let mut level = band(base_reading(definition, rays, tools), config);
            // Load gates potential, so a stabilizing run never reads HIGH.
            if gating == GatingMode::Stabilize && level == SignalLevel::High {
                level = SignalLevel::Moderate;
            }

            let mut drivers = Vec::new();
            if !definition.rays.is_empty() {
                let ids: Vec<&str> = definition.rays.iter().map(|r| r.as_str()).collect();
                drivers.push(format!("Rays: {}", ids.join(", ")));
            }
            if !definition.tools.is_empty() {
                let ids: Vec<String> = definition.tools.iter().map(|t| t.id()).collect();
                drivers.push(format!("Tools: {}", ids.join(", ")));
            }

            ExecutiveSignal {
                signal_id: definition.id.to_string(),
                label: definition.label.to_string(),
                category: definition.category,
                level,
                confidence_band: quality.confidence_band,
                drivers,
                moderators: moderators.clone(),
            }
        })
        .collect();

    debug!(
        high = signals.iter().filter(|s| s.level == SignalLevel::High).count(),
        moderated = !moderators.is_empty(),
        "Derived executive signals"
    );

    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConfidenceBand, EclipseModifier};

    fn rays_at(access: f64) -> BTreeMap<RayId, RayOutput> {
        RayId::ALL
            .iter()
            .map(|id| {
                (
                    *id,
                    RayOutput {
                        ray_id: *id,
                        ray_name: id.name().to_string(),
                        phase: id.phase(),
                        score: access,
                        access_score: access,
                        eclipse_score: 0.0,
                        net_energy: 50.0,
                        eclipse_modifier: EclipseModifier::None,
                        subfacets: BTreeMap::new(),
                    },
                )
            })
            .collect()
    }

    fn quality(band: ConfidenceBand, flags: Vec<ValidityFlag>) -> DataQuality {
        DataQuality {
            confidence_band: band,
            validity_flags: flags,
            longest_identical_run: 1,
            response_sd: 1.2,
            subfacet_sd: 15.0,
            duration_seconds: None,
            social_desirability: None,
            inconsistent_pairs: 0,
            attention_misses: 0,
            infrequency_hits: 0,
            low_coverage_subfacets: 0,
            quality_notes: vec![],
        }
    }

    fn composite(tool: Tool, usage: Option<f64>, access: Option<f64>) -> ToolComposite {
        ToolComposite {
            tool_id: tool.id(),
            name: tool.name().to_string(),
            usage,
            access,
            distortion: None,
            item_count: 9,
            coverage: 1.0,
        }
    }

    fn find<'a>(signals: &'a [ExecutiveSignal], id: &str) -> &'a ExecutiveSignal {
        signals.iter().find(|s| s.signal_id == id).unwrap()
    }

    #[test]
    fn test_table_is_complete_and_ordered() {
        for (i, definition) in SIGNALS.iter().enumerate() {
            assert_eq!(definition.id, format!("M{:03}", i + 1));
            assert!(!definition.rays.is_empty());
            let expected = if i < 18 {
                SignalCategory::Core
            } else {
                SignalCategory::Executive
            };
            assert_eq!(definition.category, expected);
        }
    }

    #[test]
    fn test_band_edges() {
        let config = ExecutiveConfig::default();
        assert_eq!(band(None, &config), SignalLevel::Low);
        assert_eq!(band(Some(1.49), &config), SignalLevel::Low);
        assert_eq!(band(Some(1.5), &config), SignalLevel::Moderate);
        assert_eq!(band(Some(2.5), &config), SignalLevel::Elevated);
        assert_eq!(band(Some(3.5), &config), SignalLevel::High);
    }

    #[test]
    fn test_rays_and_tools_are_averaged() {
        // Rays read 2.0 on the 0-4 scale; If/Then access 4.0 lifts M001.
        let tools = vec![composite(Tool::IfThenPlanning, Some(1.0), Some(4.0))];
        let signals = derive_signals(
            &rays_at(50.0),
            &tools,
            GatingMode::BuildRange,
            &quality(ConfidenceBand::High, vec![]),
            &ExecutiveConfig::default(),
        );
        assert_eq!(signals.len(), 24);

        let m001 = find(&signals, "M001");
        assert_eq!(m001.label, "Daily Intentionality");
        assert_eq!(m001.level, SignalLevel::Elevated);
        assert_eq!(m001.drivers, vec!["Rays: R1", "Tools: T010"]);
        assert!(m001.moderators.is_empty());

        // Without tool readings only the rays count.
        assert_eq!(find(&signals, "M005").level, SignalLevel::Moderate);
    }

    #[test]
    fn test_usage_stands_in_for_missing_access() {
        let tools = vec![composite(Tool::PresencePause, Some(4.0), None)];
        let signals = derive_signals(
            &rays_at(100.0),
            &tools,
            GatingMode::Stretch,
            &quality(ConfidenceBand::High, vec![]),
            &ExecutiveConfig::default(),
        );
        assert_eq!(find(&signals, "M005").level, SignalLevel::High);
        // High capacity means low burnout risk.
        assert_eq!(find(&signals, "M019").level, SignalLevel::Low);
    }

    #[test]
    fn test_stabilize_caps_high() {
        let signals = derive_signals(
            &rays_at(100.0),
            &[],
            GatingMode::Stabilize,
            &quality(ConfidenceBand::Moderate, vec![]),
            &ExecutiveConfig::default(),
        );
        let m009 = find(&signals, "M009");
        assert_eq!(m009.level, SignalLevel::Moderate);
        assert_eq!(m009.confidence_band, ConfidenceBand::Moderate);
        assert!(signals.iter().all(|s| s.level != SignalLevel::High));
    }

    #[test]
    fn test_validity_moderators() {
        let signals = derive_signals(
            &rays_at(60.0),
            &[],
            GatingMode::BuildRange,
            &quality(
                ConfidenceBand::Low,
                vec![ValidityFlag::ImpressionManagement, ValidityFlag::Inconsistency],
            ),
            &ExecutiveConfig::default(),
        );
        for signal in &signals {
            assert_eq!(signal.moderators.len(), 2);
            assert!(signal.moderators[0].contains("inflated"));
            assert_eq!(signal.moderators[1], "Inconsistency detected");
        }
    }
}
