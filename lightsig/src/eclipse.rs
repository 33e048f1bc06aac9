//! Eclipse dimension analysis.
//!
//! Load dimensions are measured straight from the tagged indicator items,
//! before any ray aggregation, so Access can fold load pressure back in.
//! Once rays are aggregated, [`analyze`] derives the run-level indices and
//! the gating decision.

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{EclipseConfig, PhaseWeights};
use crate::error::{Result, ScoringError};
use crate::intake::ResponseSet;
use crate::types::{
    DerivedMetrics, DimensionScore, EclipseDimensions, EclipseLevel, EclipseOutput, Gating,
    GatingMode, RayOutput,
};
use instrument::{LoadDimension, Phase, RayId};

/// Upper end of the load dimension scale.
pub const DIMENSION_MAX: f64 = 4.0;

/// Constant added to both sides of the EER ratio.
const EER_SMOOTHING: f64 = 5.0;

/// Load on each dimension, 0 (none) to 4 (maximal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadProfile {
    pub emotional: f64,
    pub cognitive: f64,
    pub relational: f64,
}

impl LoadProfile {
    pub fn get(&self, dimension: LoadDimension) -> f64 {
        match dimension {
            LoadDimension::Emotional => self.emotional,
            LoadDimension::Cognitive => self.cognitive,
            LoadDimension::Relational => self.relational,
        }
    }

    pub fn mean(&self) -> f64 {
        (self.emotional + self.cognitive + self.relational) / 3.0
    }

    /// Mean load rescaled to 0-100.
    pub fn load_pressure(&self) -> f64 {
        self.mean() / DIMENSION_MAX * 100.0
    }

    /// Eclipse score (0-100) of a ray in `phase`.
    pub fn ray_eclipse(&self, weights: &PhaseWeights, phase: Phase) -> f64 {
        let weights = weights.for_phase(phase);
        let weighted: f64 = LoadDimension::ALL
            .iter()
            .map(|d| weights.weight(*d) * self.get(*d))
            .sum();
        (weighted / DIMENSION_MAX * 100.0).clamp(0.0, 100.0)
    }

    fn to_output(self) -> EclipseDimensions {
        EclipseDimensions {
            emotional_load: DimensionScore {
                score: self.emotional,
            },
            cognitive_load: DimensionScore {
                score: self.cognitive,
            },
            relational_load: DimensionScore {
                score: self.relational,
            },
        }
    }
}

/// Measure the three load dimensions from answered indicator items.
///
/// An indicator reads as load when capacity under pressure is low, so each
/// item contributes `(1 - reading) * 4`.
pub fn measure_dimensions(set: &ResponseSet<'_>) -> Result<LoadProfile> {
    let manifest = set.manifest();
    let dimension = |d: LoadDimension| -> Result<f64> {
        let loads: Vec<f64> = manifest
            .load_indicators(d)
            .filter_map(|q| set.value(&q.id).map(|v| (1.0 - q.reading(v)) * DIMENSION_MAX))
            .collect();
        if loads.is_empty() {
            return Err(ScoringError::ComputationInvariant(format!(
                "no answered indicator for {} load",
                d.as_str()
            )));
        }
        Ok(loads.iter().sum::<f64>() / loads.len() as f64)
    };

    let profile = LoadProfile {
        emotional: dimension(LoadDimension::Emotional)?,
        cognitive: dimension(LoadDimension::Cognitive)?,
        relational: dimension(LoadDimension::Relational)?,
    };

    debug!(
        run_id = %set.run_id,
        emotional = profile.emotional,
        cognitive = profile.cognitive,
        relational = profile.relational,
        "Measured load dimensions"
    );

    Ok(profile)
}

/// Level for a load pressure value.
pub fn level_for(load_pressure: f64, config: &EclipseConfig) -> EclipseLevel {
    let levels = &config.levels;
    if load_pressure < levels.moderate {
        EclipseLevel::Low
    } else if load_pressure < levels.elevated {
        EclipseLevel::Moderate
    } else if load_pressure < levels.high {
        EclipseLevel::Elevated
    } else {
        EclipseLevel::High
    }
}

/// Energy efficiency ratio over 0-4 rescaled Shine and Eclipse totals.
pub fn energy_efficiency(rays: &BTreeMap<RayId, RayOutput>) -> f64 {
    let shine: f64 = rays.values().map(|r| r.score / 25.0).sum();
    let eclipse: f64 = rays.values().map(|r| r.eclipse_score / 25.0).sum();
    (shine + EER_SMOOTHING) / (eclipse + EER_SMOOTHING)
}

/// Burnout risk index: rays whose eclipse exceeds their shine.
pub fn burnout_risk(rays: &BTreeMap<RayId, RayOutput>) -> usize {
    rays.values().filter(|r| r.eclipse_score > r.score).count()
}

/// Choose the gating mode and explain it.
pub fn gate(
    level: EclipseLevel,
    load_pressure: f64,
    eer: f64,
    bri: usize,
    config: &EclipseConfig,
) -> Gating {
    if level >= EclipseLevel::Elevated {
        Gating {
            mode: GatingMode::Stabilize,
            reason: format!(
                "Eclipse level {} (load pressure {:.1}): stabilize before adding intensity.",
                level.as_str(),
                load_pressure
            ),
        }
    } else if bri >= config.stabilize_bri {
        Gating {
            mode: GatingMode::Stabilize,
            reason: format!(
                "BRI {} of 9 rays meets the threshold of {}: stabilize before adding intensity.",
                bri, config.stabilize_bri
            ),
        }
    } else if level == EclipseLevel::Low && eer >= config.stretch_eer {
        Gating {
            mode: GatingMode::Stretch,
            reason: format!(
                "EER {:.2} at or above {:.2} with LOW eclipse: ready to stretch.",
                eer, config.stretch_eer
            ),
        }
    } else if level == EclipseLevel::Low {
        Gating {
            mode: GatingMode::BuildRange,
            reason: format!(
                "EER {:.2} below {:.2}: build range before stretching.",
                eer, config.stretch_eer
            ),
        }
    } else {
        Gating {
            mode: GatingMode::BuildRange,
            reason: format!(
                "Eclipse level {} (load pressure {:.1}): build range before stretching.",
                level.as_str(),
                load_pressure
            ),
        }
    }
}

/// Derive run-level eclipse output from load and aggregated rays.
///
/// The performance-presence delta is left empty here; the signal classifier
/// owns it.
pub fn analyze(
    profile: &LoadProfile,
    rays: &BTreeMap<RayId, RayOutput>,
    config: &EclipseConfig,
) -> EclipseOutput {
    let load_pressure = profile.load_pressure();
    let recovery_access = (100.0 - load_pressure).max(0.0);
    let eer = energy_efficiency(rays);
    let bri = burnout_risk(rays);
    let level = level_for(load_pressure, config);
    let gating = gate(level, load_pressure, eer, bri, config);

    debug!(
        level = level.as_str(),
        load_pressure,
        eer,
        bri,
        mode = gating.mode.as_str(),
        "Eclipse analyzed"
    );

    EclipseOutput {
        level,
        dimensions: profile.to_output(),
        derived_metrics: DerivedMetrics {
            recovery_access,
            load_pressure,
            eer,
            bri,
            performance_presence_delta: None,
        },
        gating,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::{validate, Response, ResponsePacket, Tier};
    use crate::types::EclipseModifier;
    use instrument::QuestionManifest;

    fn ray(id: RayId, score: f64, eclipse_score: f64) -> RayOutput {
        RayOutput {
            ray_id: id,
            ray_name: id.name().to_string(),
            phase: id.phase(),
            score,
            access_score: score,
            eclipse_score,
            net_energy: (score - eclipse_score + 100.0) / 2.0,
            eclipse_modifier: EclipseModifier::None,
            subfacets: BTreeMap::new(),
        }
    }

    fn uniform_rays(score: f64, eclipse_score: f64) -> BTreeMap<RayId, RayOutput> {
        RayId::ALL
            .iter()
            .map(|id| (*id, ray(*id, score, eclipse_score)))
            .collect()
    }

    #[test]
    fn test_dimensions_from_indicators() {
        let manifest = QuestionManifest::standard();
        let responses = manifest
            .questions
            .iter()
            .map(|q| {
                let value = match q.load_dimension {
                    Some(LoadDimension::Emotional) => 0,
                    Some(LoadDimension::Cognitive) => 2,
                    _ => 4,
                };
                Response::new(q.id.clone(), value)
            })
            .collect();
        let packet = ResponsePacket::new(Tier::Full, responses);
        let set = validate(&manifest, &packet).unwrap();

        let profile = measure_dimensions(&set).unwrap();
        assert_eq!(profile.emotional, 4.0);
        assert_eq!(profile.cognitive, 2.0);
        assert_eq!(profile.relational, 0.0);
        assert_eq!(profile.load_pressure(), 50.0);
    }

    #[test]
    fn test_ray_eclipse_weights() {
        let profile = LoadProfile {
            emotional: 4.0,
            cognitive: 0.0,
            relational: 0.0,
        };
        let weights = PhaseWeights::default();
        assert_eq!(profile.ray_eclipse(&weights, Phase::Reconnect), 50.0);
        assert!((profile.ray_eclipse(&weights, Phase::Become) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_level_breakpoints() {
        let config = EclipseConfig::default();
        assert_eq!(level_for(0.0, &config), EclipseLevel::Low);
        assert_eq!(level_for(24.99, &config), EclipseLevel::Low);
        assert_eq!(level_for(25.0, &config), EclipseLevel::Moderate);
        assert_eq!(level_for(49.99, &config), EclipseLevel::Moderate);
        assert_eq!(level_for(50.0, &config), EclipseLevel::Elevated);
        assert_eq!(level_for(74.99, &config), EclipseLevel::Elevated);
        assert_eq!(level_for(75.0, &config), EclipseLevel::High);
        assert_eq!(level_for(100.0, &config), EclipseLevel::High);
    }

    #[test]
    fn test_eer_and_bri() {
        let rays = uniform_rays(100.0, 0.0);
        assert!((energy_efficiency(&rays) - 41.0 / 5.0).abs() < 1e-9);
        assert_eq!(burnout_risk(&rays), 0);

        let mut rays = uniform_rays(50.0, 40.0);
        for id in [RayId::R1, RayId::R2, RayId::R3] {
            rays.get_mut(&id).unwrap().eclipse_score = 60.0;
        }
        assert_eq!(burnout_risk(&rays), 3);
    }

    #[test]
    fn test_gating_rules() {
        let config = EclipseConfig::default();

        let g = gate(EclipseLevel::Elevated, 55.0, 3.0, 0, &config);
        assert_eq!(g.mode, GatingMode::Stabilize);
        assert!(g.reason.contains("ELEVATED"));

        let g = gate(EclipseLevel::Moderate, 30.0, 1.2, 3, &config);
        assert_eq!(g.mode, GatingMode::Stabilize);
        assert!(g.reason.contains("BRI 3"));

        let g = gate(EclipseLevel::Low, 10.0, 1.5, 0, &config);
        assert_eq!(g.mode, GatingMode::Stretch);

        let g = gate(EclipseLevel::Low, 10.0, 1.49, 0, &config);
        assert_eq!(g.mode, GatingMode::BuildRange);

        let g = gate(EclipseLevel::Moderate, 30.0, 4.0, 0, &config);
        assert_eq!(g.mode, GatingMode::BuildRange);
        assert_eq!(
            g.reason,
            "Eclipse level MODERATE (load pressure 30.0): build range before stretching."
        );
    }

    #[test]
    fn test_analyze_no_load() {
        let profile = LoadProfile {
            emotional: 0.0,
            cognitive: 0.0,
            relational: 0.0,
        };
        let output = analyze(&profile, &uniform_rays(100.0, 0.0), &EclipseConfig::default());
        assert_eq!(output.level, EclipseLevel::Low);
        assert_eq!(output.derived_metrics.recovery_access, 100.0);
        assert_eq!(output.gating.mode, GatingMode::Stretch);
        assert!(output.derived_metrics.performance_presence_delta.is_none());
    }
}
