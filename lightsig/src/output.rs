//! Output assembly.
//!
//! Packages stage results into [`AssessmentOutputV1`] and verifies every
//! documented range before anything leaves the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::aggregate::net_energy;
use crate::eclipse::DIMENSION_MAX;
use crate::error::{Result, ScoringError};
use crate::intake::Tier;
use crate::executive::SIGNALS;
use crate::types::{
    ActingVsCapacity, DataQuality, EclipseOutput, EdgeCase, ExecutiveSignal, LightSignature,
    ProfileFlag, Recommendations, RayOutput, ToolComposite,
};
use instrument::{RayId, Tool};

/// Tolerance for recomputed values.
const EPSILON: f64 = 1e-9;

/// Identity of the run an output belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct AssessmentRun {
    pub run_id: String,
    pub instrument_version: String,
    pub tier: Tier,
    /// Fingerprint of the reference tables used
    pub manifest_fingerprint: String,
    pub computed_at: DateTime<Utc>,
}

/// Complete result of one assessment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct AssessmentOutputV1 {
    pub assessment_run: AssessmentRun,
    #[cfg_attr(feature = "typescript", ts(type = "Record<RayId, RayOutput>"))]
    pub rays: BTreeMap<RayId, RayOutput>,
    pub eclipse: EclipseOutput,
    pub light_signature: LightSignature,
    pub acting_vs_capacity: ActingVsCapacity,
    pub recommendations: Recommendations,
    pub data_quality: DataQuality,
    pub edge_cases: Vec<EdgeCase>,
    pub profile_flag: ProfileFlag,
    #[serde(default)]
    pub tool_composites: Vec<ToolComposite>,
    #[serde(default)]
    pub executive_signals: Vec<ExecutiveSignal>,
}

impl AssessmentOutputV1 {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ScoringError::ComputationInvariant(format!("output not serializable: {}", e)))
    }

    pub fn ray(&self, id: RayId) -> Option<&RayOutput> {
        self.rays.get(&id)
    }
}

/// Stage results ready for packaging.
pub struct OutputParts {
    pub run: AssessmentRun,
    pub rays: BTreeMap<RayId, RayOutput>,
    pub eclipse: EclipseOutput,
    pub light_signature: LightSignature,
    pub acting_vs_capacity: ActingVsCapacity,
    pub recommendations: Recommendations,
    pub data_quality: DataQuality,
    pub edge_cases: Vec<EdgeCase>,
    pub profile_flag: ProfileFlag,
    pub tool_composites: Vec<ToolComposite>,
    pub executive_signals: Vec<ExecutiveSignal>,
}

/// Package stage results and check invariants.
pub fn assemble(parts: OutputParts) -> Result<AssessmentOutputV1> {
    let mut eclipse = parts.eclipse;
    eclipse.derived_metrics.performance_presence_delta = Some(parts.acting_vs_capacity.delta);

    let output = AssessmentOutputV1 {
        assessment_run: parts.run,
        rays: parts.rays,
        eclipse,
        light_signature: parts.light_signature,
        acting_vs_capacity: parts.acting_vs_capacity,
        recommendations: parts.recommendations,
        data_quality: parts.data_quality,
        edge_cases: parts.edge_cases,
        profile_flag: parts.profile_flag,
        tool_composites: parts.tool_composites,
        executive_signals: parts.executive_signals,
    };

    check_invariants(&output)?;
    Ok(output)
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ScoringError::ComputationInvariant(format!(
            "{} = {} outside {}..{}",
            name, value, min, max
        )))
    }
}

/// Verify every documented range and formula.
pub fn check_invariants(output: &AssessmentOutputV1) -> Result<()> {
    if output.rays.len() != RayId::ALL.len() {
        return Err(ScoringError::ComputationInvariant(format!(
            "expected 9 rays, got {}",
            output.rays.len()
        )));
    }

    for (id, ray) in &output.rays {
        check_range(&format!("{} score", id), ray.score, 0.0, 100.0)?;
        check_range(&format!("{} access_score", id), ray.access_score, 0.0, 100.0)?;
        check_range(&format!("{} eclipse_score", id), ray.eclipse_score, 0.0, 100.0)?;
        check_range(&format!("{} net_energy", id), ray.net_energy, 0.0, 100.0)?;

        let expected = net_energy(ray.score, ray.eclipse_score);
        if (ray.net_energy - expected).abs() > EPSILON {
            return Err(ScoringError::ComputationInvariant(format!(
                "{} net_energy {} does not match {}",
                id, ray.net_energy, expected
            )));
        }

        for (sid, subfacet) in &ray.subfacets {
            if sid.ray != *id {
                return Err(ScoringError::ComputationInvariant(format!(
                    "subfacet {} listed under {}",
                    sid, id
                )));
            }
            check_range(&format!("{} score", sid), subfacet.score, 0.0, 100.0)?;
            if let Some(access) = subfacet.access_score {
                check_range(&format!("{} access_score", sid), access, 0.0, 100.0)?;
            }
        }
    }

    let dims = &output.eclipse.dimensions;
    check_range("emotional_load", dims.emotional_load.score, 0.0, DIMENSION_MAX)?;
    check_range("cognitive_load", dims.cognitive_load.score, 0.0, DIMENSION_MAX)?;
    check_range("relational_load", dims.relational_load.score, 0.0, DIMENSION_MAX)?;

    let metrics = &output.eclipse.derived_metrics;
    check_range("load_pressure", metrics.load_pressure, 0.0, 100.0)?;
    check_range("recovery_access", metrics.recovery_access, 0.0, 100.0)?;
    check_range("eer", metrics.eer, 0.0, f64::MAX)?;
    if metrics.bri > RayId::ALL.len() {
        return Err(ScoringError::ComputationInvariant(format!(
            "bri {} exceeds ray count",
            metrics.bri
        )));
    }
    if let Some(ppd) = metrics.performance_presence_delta {
        check_range("performance_presence_delta", ppd, -100.0, 100.0)?;
    }

    if output.recommendations.tools.len() != 2 {
        return Err(ScoringError::ComputationInvariant(format!(
            "expected 2 tools, got {}",
            output.recommendations.tools.len()
        )));
    }

    if output.tool_composites.len() != Tool::ALL.len() {
        return Err(ScoringError::ComputationInvariant(format!(
            "expected {} tool composites, got {}",
            Tool::ALL.len(),
            output.tool_composites.len()
        )));
    }
    for tool in &output.tool_composites {
        for (name, reading) in [
            ("usage", tool.usage),
            ("access", tool.access),
            ("distortion", tool.distortion),
        ] {
            if let Some(value) = reading {
                check_range(&format!("{} {}", tool.tool_id, name), value, 0.0, 4.0)?;
            }
        }
        check_range(&format!("{} coverage", tool.tool_id), tool.coverage, 0.0, 1.0)?;
    }

    if output.executive_signals.len() != SIGNALS.len() {
        return Err(ScoringError::ComputationInvariant(format!(
            "expected {} executive signals, got {}",
            SIGNALS.len(),
            output.executive_signals.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ScoringEngine;
    use crate::intake::{Response, ResponsePacket};
    use instrument::ReferenceTables;
    use std::sync::Arc;

    fn scored() -> AssessmentOutputV1 {
        let tables = Arc::new(ReferenceTables::standard());
        let engine = ScoringEngine::new(tables.clone(), Default::default()).unwrap();
        let responses = tables
            .manifest
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| Response::new(q.id.clone(), ((i * 7 + q.ray_id.number() as usize) % 5) as i32))
            .collect();
        engine.score(&ResponsePacket::new(Tier::Full, responses)).unwrap()
    }

    #[test]
    fn test_valid_output_passes() {
        let output = scored();
        check_invariants(&output).unwrap();
        assert!(output.eclipse.derived_metrics.performance_presence_delta.is_some());
    }

    #[test]
    fn test_broken_net_energy_is_rejected() {
        let mut output = scored();
        output.rays.get_mut(&RayId::R2).unwrap().net_energy += 1.0;
        let err = check_invariants(&output).unwrap_err();
        assert!(err.to_string().contains("R2 net_energy"));
    }

    #[test]
    fn test_tool_reading_out_of_range_is_rejected() {
        let mut output = scored();
        output.tool_composites[4].access = Some(4.5);
        let err = check_invariants(&output).unwrap_err();
        assert!(err.to_string().contains("T005 access"));

        let mut output = scored();
        output.executive_signals.pop();
        assert!(check_invariants(&output).is_err());
    }

    #[test]
    fn test_nan_is_rejected() {
        let mut output = scored();
        output.eclipse.derived_metrics.eer = f64::NAN;
        assert!(matches!(
            check_invariants(&output),
            Err(ScoringError::ComputationInvariant(_))
        ));
    }

    #[test]
    fn test_json_shape() {
        let output = scored();
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert!(value["rays"]["R1"]["subfacets"]["R1a"]["score"].is_number());
        assert!(value["eclipse"]["dimensions"]["emotional_load"]["score"].is_number());
        assert_eq!(value["assessment_run"]["tier"], "full");
        assert_eq!(value["edge_cases"].as_array().unwrap().len(), 10);
        assert!(value["eclipse"]["gating"]["mode"].is_string());
        assert_eq!(value["tool_composites"][0]["tool_id"], "T001");
        assert!(value["tool_composites"][0]["usage"].is_null());
        assert_eq!(value["executive_signals"].as_array().unwrap().len(), 24);
        assert_eq!(value["executive_signals"][18]["category"], "EXEC_6");

        let back: AssessmentOutputV1 = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(back.light_signature.archetype, output.light_signature.archetype);
        assert_eq!(back.edge_cases, output.edge_cases);
    }
}
