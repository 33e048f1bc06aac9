//! Ray aggregation.
//!
//! Answers reduce to subfacet scores, subfacets to ray Shine and Access, and
//! the load profile supplies each ray's Eclipse according to its phase.

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::AggregationConfig;
use crate::eclipse::LoadProfile;
use crate::error::{Result, ScoringError};
use crate::intake::ResponseSet;
use crate::types::{EclipseModifier, RayOutput, SubfacetOutput};
use instrument::{PressureMode, RayId, SubfacetId};

/// `clamp((score - eclipse + 100) / 2, 0, 100)`.
pub fn net_energy(score: f64, eclipse_score: f64) -> f64 {
    ((score - eclipse_score + 100.0) / 2.0).clamp(0.0, 100.0)
}

/// Classify how a ray behaves under load.
pub fn eclipse_modifier(
    score: f64,
    access_score: f64,
    eclipse_score: f64,
    config: &AggregationConfig,
) -> EclipseModifier {
    if access_score - score > config.amplified_margin {
        EclipseModifier::Amplified
    } else if eclipse_score - score > config.muted_margin {
        EclipseModifier::Muted
    } else {
        EclipseModifier::None
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

#[derive(Default)]
struct Readings {
    baseline: Vec<f64>,
    under_pressure: Vec<f64>,
}

/// Score every subfacet of every ray.
pub fn score_subfacets(set: &ResponseSet<'_>) -> Result<BTreeMap<SubfacetId, SubfacetOutput>> {
    let mut readings: BTreeMap<SubfacetId, Readings> = BTreeMap::new();
    for (question, value) in set.answers() {
        let entry = readings.entry(question.subfacet_id).or_default();
        match question.pressure_mode {
            PressureMode::Baseline => entry.baseline.push(question.reading(value)),
            PressureMode::UnderPressure => entry.under_pressure.push(question.reading(value)),
        }
    }

    SubfacetId::all()
        .map(|id| {
            let r = readings.remove(&id).unwrap_or_default();
            let score = mean(&r.baseline).ok_or_else(|| {
                ScoringError::ComputationInvariant(format!(
                    "subfacet {} has no answered baseline question",
                    id
                ))
            })? * 100.0;
            let access_score = mean(&r.under_pressure).map(|m| m * 100.0);
            Ok((
                id,
                SubfacetOutput {
                    subfacet_id: id,
                    label: id.label().to_string(),
                    score,
                    access_score,
                },
            ))
        })
        .collect()
}

/// Aggregate all nine rays.
pub fn aggregate_rays(
    set: &ResponseSet<'_>,
    load: &LoadProfile,
    config: &AggregationConfig,
) -> Result<BTreeMap<RayId, RayOutput>> {
    let mut subfacets = score_subfacets(set)?;
    let load_pressure = load.load_pressure();

    let mut rays = BTreeMap::new();
    for id in RayId::ALL {
        let own: BTreeMap<SubfacetId, SubfacetOutput> = id
            .subfacets()
            .iter()
            .filter_map(|s| subfacets.remove_entry(s))
            .collect();

        let shine: Vec<f64> = own.values().map(|s| s.score).collect();
        let score = mean(&shine).ok_or_else(|| {
            ScoringError::ComputationInvariant(format!("ray {} has no subfacet scores", id))
        })?;

        let access: Vec<f64> = own.values().filter_map(|s| s.access_score).collect();
        let access_score = match mean(&access) {
            Some(access) => access,
            None => score * (1.0 - config.stress_discount * load_pressure / 100.0),
        }
        .clamp(0.0, 100.0);

        let eclipse_score = load.ray_eclipse(&config.phase_weights, id.phase());
        let ray = RayOutput {
            ray_id: id,
            ray_name: id.name().to_string(),
            phase: id.phase(),
            score,
            access_score,
            eclipse_score,
            net_energy: net_energy(score, eclipse_score),
            eclipse_modifier: eclipse_modifier(score, access_score, eclipse_score, config),
            subfacets: own,
        };

        debug!(
            run_id = %set.run_id,
            ray = %id,
            shine = ray.score,
            access = ray.access_score,
            eclipse = ray.eclipse_score,
            net_energy = ray.net_energy,
            "Aggregated ray"
        );
        rays.insert(id, ray);
    }

    Ok(rays)
}
