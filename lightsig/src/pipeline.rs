//! The scoring engine.
//!
//! A run flows through the stages in a fixed order:
//!
//! 1. Intake validates the packet against the manifest
//! 2. Load dimensions are measured from indicator items
//! 3. Rays are aggregated, folding load pressure into Access
//! 4. Eclipse indices and gating are derived
//! 5. Data quality and the performance-presence delta are classified
//! 6. Tool composites are read from the supplementary items
//! 7. The light signature is resolved
//! 8. Recommendations, edge cases and executive signals are attached
//! 9. The output is assembled and checked
//!
//! Every stage is a pure function. The engine only holds the frozen
//! reference tables and configuration, so one engine can score any number
//! of runs concurrently.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::aggregate::aggregate_rays;
use crate::config::ScoringConfig;
use crate::eclipse::{analyze, measure_dimensions};
use crate::edge_cases::{detect, profile_flag};
use crate::error::Result;
use crate::executive::derive_signals;
use crate::intake::{validate, ResponsePacket};
use crate::output::{assemble, AssessmentOutputV1, AssessmentRun, OutputParts};
use crate::recommend::recommend;
use crate::signals::{assess_data_quality, classify_acting};
use crate::signature::resolve;
use crate::tools::compose_tools;
use instrument::ReferenceTables;

/// Deterministic scoring engine bound to one set of reference tables.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    tables: Arc<ReferenceTables>,
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Create an engine, rejecting invalid configuration up front.
    pub fn new(tables: Arc<ReferenceTables>, config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        tables.manifest.validate()?;
        Ok(Self { tables, config })
    }

    /// Engine over the built-in instrument with default configuration.
    pub fn standard() -> Self {
        Self {
            tables: Arc::new(ReferenceTables::standard()),
            config: ScoringConfig::default(),
        }
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a run, stamping the current time.
    pub fn score(&self, packet: &ResponsePacket) -> Result<AssessmentOutputV1> {
        self.score_at(packet, Utc::now())
    }

    /// Score a run with a caller-supplied computation time.
    ///
    /// With identical packets and timestamps the output is identical.
    pub fn score_at(
        &self,
        packet: &ResponsePacket,
        computed_at: DateTime<Utc>,
    ) -> Result<AssessmentOutputV1> {
        let config = &self.config;
        let set = validate(&self.tables.manifest, packet)?;

        let load = measure_dimensions(&set)?;
        let rays = aggregate_rays(&set, &load, &config.aggregation)?;
        let eclipse = analyze(&load, &rays, &config.eclipse);

        let data_quality = assess_data_quality(&set, &rays, &config.data_quality);
        let acting_vs_capacity =
            classify_acting(&rays, data_quality.confidence_band, &config.signals);
        let tool_composites = compose_tools(&set, &config.tools);

        let light_signature = resolve(&rays, &self.tables.archetypes, &config.signature)?;
        let recommendations = recommend(&light_signature, &eclipse.gating);
        let edge_cases = detect(
            &rays,
            &light_signature,
            &eclipse,
            &data_quality,
            &config.eclipse,
        );
        let profile_flag = profile_flag(&light_signature, &data_quality);
        let executive_signals = derive_signals(
            &rays,
            &tool_composites,
            eclipse.gating.mode,
            &data_quality,
            &config.executive,
        );

        debug!(
            run_id = %set.run_id,
            detected_edge_cases = edge_cases.iter().filter(|c| c.detected).count(),
            "Scoring stages complete"
        );

        let output = assemble(OutputParts {
            run: AssessmentRun {
                run_id: set.run_id.clone(),
                instrument_version: self.tables.manifest.version.clone(),
                tier: set.tier,
                manifest_fingerprint: self.tables.fingerprint.clone(),
                computed_at,
            },
            rays,
            eclipse,
            light_signature,
            acting_vs_capacity,
            recommendations,
            data_quality,
            edge_cases,
            profile_flag,
            tool_composites,
            executive_signals,
        })?;

        info!(
            run_id = %output.assessment_run.run_id,
            archetype = %output.light_signature.archetype.name,
            rise_path = %output.light_signature.just_in_ray.ray_id,
            gating = output.eclipse.gating.mode.as_str(),
            confidence = ?output.data_quality.confidence_band,
            "Assessment scored"
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::intake::{Response, Tier};
    use crate::types::{ConfidenceBand, EclipseLevel, GatingMode};
    use chrono::TimeZone;
    use instrument::RayId;

    fn uniform(engine: &ScoringEngine, value: i32) -> ResponsePacket {
        let responses = engine
            .tables()
            .manifest
            .questions
            .iter()
            .map(|q| Response::new(q.id.clone(), value))
            .collect();
        ResponsePacket::new(Tier::Full, responses)
    }

    #[test]
    fn test_all_high() {
        let engine = ScoringEngine::standard();
        let output = engine.score(&uniform(&engine, 4)).unwrap();

        for ray in output.rays.values() {
            assert_eq!(ray.score, 100.0);
        }
        assert_eq!(output.eclipse.level, EclipseLevel::Low);
        assert_eq!(output.eclipse.derived_metrics.bri, 0);
        assert_eq!(output.eclipse.derived_metrics.load_pressure, 0.0);
        assert!(matches!(
            output.eclipse.gating.mode,
            GatingMode::Stretch | GatingMode::BuildRange
        ));
    }

    #[test]
    fn test_all_low() {
        let engine = ScoringEngine::standard();
        let output = engine.score(&uniform(&engine, 0)).unwrap();

        for ray in output.rays.values() {
            assert_eq!(ray.score, 0.0);
        }
        assert_eq!(output.data_quality.confidence_band, ConfidenceBand::Low);
        assert_eq!(output.eclipse.level, EclipseLevel::High);
        assert_eq!(output.eclipse.gating.mode, GatingMode::Stabilize);
    }

    #[test]
    fn test_check_and_tool_items_reach_the_output() {
        let engine = ScoringEngine::standard();
        let mut packet = uniform(&engine, 4);
        for id in ["VSD1", "VSD2", "VSD3", "VSD4"] {
            packet.responses.push(Response::new(id, 4));
        }
        for n in 1..=9 {
            packet.responses.push(Response::new(format!("T012-{}", n), 4));
        }
        let output = engine.score(&packet).unwrap();

        assert_eq!(output.data_quality.social_desirability, Some(4.0));
        assert_eq!(output.data_quality.confidence_band, ConfidenceBand::Low);
        let witness = &output.tool_composites[11];
        assert_eq!(witness.usage, Some(4.0));
        assert_eq!(witness.distortion, Some(4.0));
        let m018 = &output.executive_signals[17];
        assert_eq!(m018.signal_id, "M018");
        assert_eq!(m018.confidence_band, ConfidenceBand::Low);
        assert!(!m018.moderators.is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ScoringConfig::default();
        config.signals.flagged_gap = 5.0;
        let err = ScoringEngine::new(Arc::new(ReferenceTables::standard()), config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_stamps_metadata() {
        let engine = ScoringEngine::standard();
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let packet = uniform(&engine, 3);
        let output = engine.score_at(&packet, at).unwrap();

        assert_eq!(output.assessment_run.computed_at, at);
        assert_eq!(output.assessment_run.run_id, packet.run_id);
        assert_eq!(output.assessment_run.instrument_version, "v1");
        assert_eq!(
            output.assessment_run.manifest_fingerprint,
            engine.tables().fingerprint
        );
        // Uniform answers tie every ray; lowest ids win the top two.
        assert_eq!(output.light_signature.top_two[0].ray_id, RayId::R1);
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ScoringEngine>();
    }
}
