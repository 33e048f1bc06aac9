//! Archetype resolution.
//!
//! Rays are ranked by net energy, highest first, with ties going to the
//! smaller ray id. The top two name the archetype, the last is the Rise Path.

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::SignatureConfig;
use crate::error::{Result, ScoringError};
use crate::signals::std_dev;
use crate::types::{ArchetypeRef, LightSignature, RayOutput, RayRef};
use instrument::{ArchetypePair, ArchetypeTable, RayId};

/// Rays ordered by net energy descending, ties by ray id ascending.
pub fn rank(rays: &BTreeMap<RayId, RayOutput>) -> Result<Vec<&RayOutput>> {
    if let Some(bad) = rays.values().find(|r| !r.net_energy.is_finite()) {
        return Err(ScoringError::ComputationInvariant(format!(
            "ray {} has non-finite net energy",
            bad.ray_id
        )));
    }

    let mut ranked: Vec<&RayOutput> = rays.values().collect();
    ranked.sort_by(|a, b| {
        b.net_energy
            .total_cmp(&a.net_energy)
            .then_with(|| a.ray_id.cmp(&b.ray_id))
    });
    Ok(ranked)
}

fn ray_ref(ray: &RayOutput) -> RayRef {
    RayRef {
        ray_id: ray.ray_id,
        ray_name: ray.ray_name.clone(),
        net_energy: ray.net_energy,
        under_load_distortion: ray.ray_id.definition().under_load_distortion.to_string(),
    }
}

/// Resolve the light signature of a run.
pub fn resolve(
    rays: &BTreeMap<RayId, RayOutput>,
    table: &ArchetypeTable,
    config: &SignatureConfig,
) -> Result<LightSignature> {
    let ranked = rank(rays)?;
    if ranked.len() != RayId::ALL.len() {
        return Err(ScoringError::ComputationInvariant(format!(
            "expected {} rays, got {}",
            RayId::ALL.len(),
            ranked.len()
        )));
    }

    let (first, second, last) = (ranked[0], ranked[1], ranked[ranked.len() - 1]);
    let pair = ArchetypePair::new(first.ray_id, second.ray_id)?;
    let archetype = table.get(&pair).ok_or_else(|| {
        ScoringError::Configuration(format!("archetype table has no entry for {}", pair))
    })?;

    let gap = |a: usize, b: usize| (ranked[a].net_energy - ranked[b].net_energy).abs();
    let n = ranked.len();
    let close_call = gap(1, 2) <= config.close_call_gap || gap(n - 2, n - 1) <= config.close_call_gap;

    let energies: Vec<f64> = ranked.iter().map(|r| r.net_energy).collect();
    let flat_profile = std_dev(&energies) < config.flat_profile_sd;

    debug!(
        pair = %pair,
        archetype = %archetype.name,
        rise_path = %last.ray_id,
        close_call,
        flat_profile,
        "Resolved light signature"
    );

    Ok(LightSignature {
        top_two: [ray_ref(first), ray_ref(second)],
        just_in_ray: ray_ref(last),
        archetype: ArchetypeRef {
            pair_code: pair.code(),
            name: archetype.name.clone(),
            essence: archetype.essence.clone(),
        },
        close_call,
        flat_profile,
    })
}
