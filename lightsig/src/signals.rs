//! System-level signals.
//!
//! Two independent readings of a run: whether visible output is outrunning
//! the capacity that sustains it (performance-presence delta), and whether
//! the response pattern itself can be trusted (data quality).

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::{DataQualityConfig, SignalsConfig};
use crate::intake::ResponseSet;
use crate::types::{
    ActingStatus, ActingVsCapacity, ConfidenceBand, DataQuality, LanguageMode, RayOutput,
    ValidityFlag,
};
use crate::validity::tally_checks;
use instrument::RayId;

/// Rays whose Shine reflects visible output.
pub const OUTPUT_RAYS: [RayId; 3] = [RayId::R4, RayId::R5, RayId::R6];

/// Rays whose Access reflects the capacity that sustains output.
pub const GROUNDING_RAYS: [RayId; 3] = [RayId::R2, RayId::R3, RayId::R7];

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values.iter().copied());
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Longest run of identical consecutive values.
pub fn longest_identical_run(values: &[i32]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;
    for value in values {
        if previous == Some(value) {
            current += 1;
        } else {
            current = 1;
            previous = Some(value);
        }
        longest = longest.max(current);
    }
    longest
}

/// Compare output-ray Shine with grounding-ray Access.
pub fn classify_acting(
    rays: &BTreeMap<RayId, RayOutput>,
    confidence: ConfidenceBand,
    config: &SignalsConfig,
) -> ActingVsCapacity {
    let output = mean(OUTPUT_RAYS.iter().filter_map(|id| rays.get(id)).map(|r| r.score));
    let grounding = mean(
        GROUNDING_RAYS
            .iter()
            .filter_map(|id| rays.get(id))
            .map(|r| r.access_score),
    );
    let delta = output - grounding;

    let status = if delta > config.flagged_gap {
        ActingStatus::Flagged
    } else if delta > config.watch_gap {
        ActingStatus::Watch
    } else {
        ActingStatus::Clear
    };

    let mut indicators = vec![
        format!("Output rays (Power, Purpose, Authenticity) average Shine {:.1}", output),
        format!("Grounding rays (Joy, Presence, Connection) average Access {:.1}", grounding),
    ];
    if status != ActingStatus::Clear {
        // Name the grounding ray carrying the least under pressure.
        if let Some(weakest) = GROUNDING_RAYS
            .iter()
            .filter_map(|id| rays.get(id))
            .min_by(|a, b| a.access_score.total_cmp(&b.access_score))
        {
            indicators.push(format!(
                "Lowest grounding Access: {} at {:.1}",
                weakest.ray_name, weakest.access_score
            ));
        }
    }

    let report_language_mode = if confidence == ConfidenceBand::Low {
        LanguageMode::ValidationRequired
    } else if status != ActingStatus::Clear {
        LanguageMode::Directional
    } else {
        LanguageMode::Standard
    };

    let next_step = match status {
        ActingStatus::Clear => {
            "Output and grounding capacity are in step. Keep the current rhythm.".to_string()
        }
        ActingStatus::Watch => {
            "Output is running ahead of grounding. Add one recovery rep per day and recheck in two weeks."
                .to_string()
        }
        ActingStatus::Flagged => {
            "Output is being carried by effort rather than capacity. Debrief with a coach before adding goals."
                .to_string()
        }
    };

    debug!(delta, status = ?status, "Classified acting vs capacity");

    ActingVsCapacity {
        status,
        delta,
        indicators,
        report_language_mode,
        next_step,
    }
}

/// Assess how far a run's response pattern can be trusted.
pub fn assess_data_quality(
    set: &ResponseSet<'_>,
    rays: &BTreeMap<RayId, RayOutput>,
    config: &DataQualityConfig,
) -> DataQuality {
    let values: Vec<i32> = set.answers().map(|(_, v)| v).collect();
    let readings: Vec<f64> = set.answers().map(|(q, v)| q.reading(v) * 4.0).collect();
    let subfacet_scores: Vec<f64> = rays
        .values()
        .flat_map(|r| r.subfacets.values().map(|s| s.score))
        .collect();

    let longest_run = longest_identical_run(&values);
    let response_sd = std_dev(&readings);
    let subfacet_sd = std_dev(&subfacet_scores);
    let duration = set.duration_secs;

    let mut flags = Vec::new();
    let mut notes = Vec::new();

    if longest_run >= config.straightline_run {
        flags.push(ValidityFlag::Straightlining);
        notes.push(format!(
            "{} identical answers in a row suggests straight-lining.",
            longest_run
        ));
    } else if longest_run >= config.straightline_caution_run {
        flags.push(ValidityFlag::StraightlineCaution);
        notes.push(format!("{} identical answers in a row.", longest_run));
    }

    if response_sd < config.low_variance_sd {
        flags.push(ValidityFlag::LowVariance);
        notes.push(format!(
            "Answer spread {:.2} is implausibly narrow.",
            response_sd
        ));
    }

    if subfacet_sd < config.flat_subfacet_sd {
        flags.push(ValidityFlag::FlatSubfacets);
        notes.push(format!(
            "Subfacet scores barely differ (SD {:.1}).",
            subfacet_sd
        ));
    }

    if let Some(secs) = duration {
        let pilot = config.pilot_median_secs;
        let speeding = secs < config.min_duration_secs
            || pilot.is_some_and(|m| secs < config.speeding_fraction * m);
        if speeding {
            flags.push(ValidityFlag::Speeding);
            notes.push(format!("Completed in {:.0} seconds.", secs));
        } else if pilot.is_some_and(|m| secs < config.speed_caution_fraction * m) {
            flags.push(ValidityFlag::SpeedCaution);
            notes.push(format!(
                "Completed in {:.0} seconds, well under the typical time.",
                secs
            ));
        }
    }

    let checks = tally_checks(set, config);
    if checks.sd_extreme(config) {
        flags.push(ValidityFlag::SocialDesirability);
        notes.push("Self-report is implausibly favourable; scores may be inflated.".to_string());
    } else if checks.sd_elevated(config) {
        flags.push(ValidityFlag::ImpressionManagement);
        notes.push("Self-report leans favourable; read high scores with care.".to_string());
    }
    if checks.inconsistent(config) {
        flags.push(ValidityFlag::Inconsistency);
        notes.push(format!(
            "{} of {} paired statements were answered inconsistently.",
            checks.inconsistent_pairs, checks.answered_pairs
        ));
    }
    if checks.inattentive(config) {
        flags.push(ValidityFlag::Attention);
        notes.push(format!("{} attention items missed.", checks.attention_misses));
    }
    if checks.infrequent(config) {
        flags.push(ValidityFlag::Infrequency);
        notes.push(format!(
            "{} implausible statements endorsed.",
            checks.infrequency_hits
        ));
    }

    if set.is_partial() {
        flags.push(ValidityFlag::Partial);
        notes.push("Preview run with a reduced question set.".to_string());
    }
    if checks.thin_coverage(config) {
        flags.push(ValidityFlag::Missingness);
        notes.push(format!(
            "{} subfacets were answered too thinly to score with confidence.",
            checks.low_coverage_subfacets
        ));
    }

    let confidence_band = confidence_band(&flags, config);
    if confidence_band == ConfidenceBand::Low {
        warn!(
            run_id = %set.run_id,
            flags = ?flags,
            "Low-confidence run"
        );
    }

    DataQuality {
        confidence_band,
        validity_flags: flags,
        longest_identical_run: longest_run,
        response_sd,
        subfacet_sd,
        duration_seconds: duration,
        social_desirability: checks.social_desirability,
        inconsistent_pairs: checks.inconsistent_pairs,
        attention_misses: checks.attention_misses,
        infrequency_hits: checks.infrequency_hits,
        low_coverage_subfacets: checks.low_coverage_subfacets,
        quality_notes: notes,
    }
}

/// Band from raised flags.
pub fn confidence_band(flags: &[ValidityFlag], config: &DataQualityConfig) -> ConfidenceBand {
    let decisive = flags.iter().any(|f| f.is_decisive());
    let hard = flags.iter().filter(|f| f.is_hard()).count();

    if decisive || hard >= config.low_band_hard_flags {
        ConfidenceBand::Low
    } else if !flags.is_empty() {
        ConfidenceBand::Moderate
    } else {
        ConfidenceBand::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_rays;
    use crate::config::AggregationConfig;
    use crate::eclipse::measure_dimensions;
    use crate::intake::{validate, Response, ResponsePacket, Tier};
    use crate::types::EclipseModifier;
    use chrono::{Duration, TimeZone, Utc};
    use instrument::{Question, QuestionManifest};

    fn ray(id: RayId, score: f64, access_score: f64) -> RayOutput {
        RayOutput {
            ray_id: id,
            ray_name: id.name().to_string(),
            phase: id.phase(),
            score,
            access_score,
            eclipse_score: 0.0,
            net_energy: (score + 100.0) / 2.0,
            eclipse_modifier: EclipseModifier::None,
            subfacets: BTreeMap::new(),
        }
    }

    fn rays_with(output_shine: f64, grounding_access: f64) -> BTreeMap<RayId, RayOutput> {
        RayId::ALL
            .iter()
            .map(|id| {
                let r = if OUTPUT_RAYS.contains(id) {
                    ray(*id, output_shine, output_shine)
                } else if GROUNDING_RAYS.contains(id) {
                    ray(*id, 60.0, grounding_access)
                } else {
                    ray(*id, 60.0, 60.0)
                };
                (*id, r)
            })
            .collect()
    }

    fn packet(manifest: &QuestionManifest, f: impl Fn(usize, &Question) -> i32) -> ResponsePacket {
        let responses = manifest
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| Response::new(q.id.clone(), f(i, q)))
            .collect();
        ResponsePacket::new(Tier::Full, responses)
    }

    fn varied(manifest: &QuestionManifest) -> ResponsePacket {
        packet(manifest, |i, q| ((i * 7 + q.ray_id.number() as usize) % 5) as i32)
    }

    fn with_checks(mut packet: ResponsePacket, checks: &[(&str, i32)]) -> ResponsePacket {
        packet
            .responses
            .extend(checks.iter().map(|(id, v)| Response::new(*id, *v)));
        packet
    }

    fn quality(packet: &ResponsePacket, config: &DataQualityConfig) -> DataQuality {
        let manifest = QuestionManifest::standard();
        let set = validate(&manifest, packet).unwrap();
        let load = measure_dimensions(&set).unwrap();
        let rays = aggregate_rays(&set, &load, &AggregationConfig::default()).unwrap();
        assess_data_quality(&set, &rays, config)
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_identical_run(&[]), 0);
        assert_eq!(longest_identical_run(&[1]), 1);
        assert_eq!(longest_identical_run(&[1, 1, 2, 2, 2, 1]), 3);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(std_dev(&[2.0, 2.0, 2.0]), 0.0);
        assert_eq!(std_dev(&[0.0, 4.0]), 2.0);
    }

    #[test]
    fn test_ppd_thresholds() {
        let config = SignalsConfig::default();

        let clear = classify_acting(&rays_with(70.0, 60.0), ConfidenceBand::High, &config);
        assert_eq!(clear.status, ActingStatus::Clear);
        assert_eq!(clear.report_language_mode, LanguageMode::Standard);
        assert_eq!(clear.indicators.len(), 2);

        let watch = classify_acting(&rays_with(80.0, 60.0), ConfidenceBand::High, &config);
        assert_eq!(watch.status, ActingStatus::Watch);
        assert_eq!(watch.delta, 20.0);
        assert_eq!(watch.report_language_mode, LanguageMode::Directional);
        assert_eq!(watch.indicators.len(), 3);

        let flagged = classify_acting(&rays_with(95.0, 60.0), ConfidenceBand::Moderate, &config);
        assert_eq!(flagged.status, ActingStatus::Flagged);

        // Exactly at the threshold is not above it
        let edge = classify_acting(&rays_with(90.0, 60.0), ConfidenceBand::High, &config);
        assert_eq!(edge.status, ActingStatus::Watch);
    }

    #[test]
    fn test_low_confidence_requires_validation_language() {
        let acting = classify_acting(&rays_with(70.0, 60.0), ConfidenceBand::Low, &SignalsConfig::default());
        assert_eq!(acting.report_language_mode, LanguageMode::ValidationRequired);
    }

    #[test]
    fn test_varied_answers_are_high_confidence() {
        let manifest = QuestionManifest::standard();
        let p = packet(&manifest, |i, q| ((i * 7 + q.ray_id.number() as usize) % 5) as i32);
        let dq = quality(&p, &DataQualityConfig::default());
        assert!(dq.longest_identical_run < 12);
        assert!(dq.response_sd > 0.35);
        assert_eq!(dq.confidence_band, ConfidenceBand::High, "{:?}", dq.validity_flags);
        assert!(dq.quality_notes.is_empty());
    }

    #[test]
    fn test_all_zero_is_straightlining() {
        let manifest = QuestionManifest::standard();
        let dq = quality(&packet(&manifest, |_, _| 0), &DataQualityConfig::default());
        assert_eq!(dq.longest_identical_run, 143);
        assert!(dq.validity_flags.contains(&ValidityFlag::Straightlining));
        assert!(dq.validity_flags.contains(&ValidityFlag::LowVariance));
        assert_eq!(dq.confidence_band, ConfidenceBand::Low);
    }

    #[test]
    fn test_speeding() {
        let manifest = QuestionManifest::standard();
        let start = Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap();
        let base = packet(&manifest, |i, q| ((i * 7 + q.ray_id.number() as usize) % 5) as i32);

        let fast = base.clone().with_timing(start, start + Duration::seconds(200));
        let dq = quality(&fast, &DataQualityConfig::default());
        assert_eq!(dq.validity_flags, vec![ValidityFlag::Speeding]);
        assert_eq!(dq.duration_seconds, Some(200.0));
        assert_eq!(dq.confidence_band, ConfidenceBand::Moderate);

        let config = DataQualityConfig {
            pilot_median_secs: Some(1200.0),
            ..Default::default()
        };
        let brisk = base.with_timing(start, start + Duration::seconds(500));
        let dq = quality(&brisk, &config);
        assert_eq!(dq.validity_flags, vec![ValidityFlag::SpeedCaution]);
        assert_eq!(dq.confidence_band, ConfidenceBand::Moderate);
    }

    #[test]
    fn test_passed_checks_keep_high_band() {
        let manifest = QuestionManifest::standard();
        let p = with_checks(
            varied(&manifest),
            &[
                ("VSD1", 1),
                ("VSD2", 2),
                ("VATT1", 0),
                ("VATT2", 4),
                ("VINF1", 0),
                ("VCON1A", 3),
                ("VCON1B", 1),
            ],
        );
        let dq = quality(&p, &DataQualityConfig::default());
        assert_eq!(dq.confidence_band, ConfidenceBand::High, "{:?}", dq.validity_flags);
        assert_eq!(dq.social_desirability, Some(1.5));
        assert_eq!(dq.attention_misses, 0);
    }

    #[test]
    fn test_elevated_desirability_is_moderate() {
        let manifest = QuestionManifest::standard();
        let p = with_checks(varied(&manifest), &[("VSD1", 4), ("VSD2", 3), ("VSD3", 3), ("VSD4", 3)]);
        let dq = quality(&p, &DataQualityConfig::default());
        assert_eq!(dq.validity_flags, vec![ValidityFlag::ImpressionManagement]);
        assert_eq!(dq.confidence_band, ConfidenceBand::Moderate);
        assert!(dq.sd_elevated());
    }

    #[test]
    fn test_extreme_desirability_is_low() {
        let manifest = QuestionManifest::standard();
        let p = with_checks(varied(&manifest), &[("VSD1", 4), ("VSD2", 4), ("VSD3", 4), ("VSD4", 4)]);
        let dq = quality(&p, &DataQualityConfig::default());
        assert_eq!(dq.validity_flags, vec![ValidityFlag::SocialDesirability]);
        assert_eq!(dq.confidence_band, ConfidenceBand::Low);
    }

    #[test]
    fn test_inconsistent_pairs_are_low() {
        let manifest = QuestionManifest::standard();
        let p = with_checks(
            varied(&manifest),
            &[("VCON1A", 4), ("VCON1B", 4), ("VCON2A", 0), ("VCON2B", 0)],
        );
        let dq = quality(&p, &DataQualityConfig::default());
        assert_eq!(dq.validity_flags, vec![ValidityFlag::Inconsistency]);
        assert_eq!(dq.inconsistent_pairs, 2);
        assert_eq!(dq.confidence_band, ConfidenceBand::Low);
    }

    #[test]
    fn test_attention_and_infrequency_together_are_low() {
        let manifest = QuestionManifest::standard();
        let config = DataQualityConfig::default();

        let attention = with_checks(varied(&manifest), &[("VATT1", 3), ("VATT2", 0)]);
        let dq = quality(&attention, &config);
        assert_eq!(dq.validity_flags, vec![ValidityFlag::Attention]);
        assert_eq!(dq.confidence_band, ConfidenceBand::Moderate);

        let both = with_checks(
            varied(&manifest),
            &[("VATT1", 3), ("VATT2", 0), ("VINF1", 4), ("VINF3", 3)],
        );
        let dq = quality(&both, &config);
        assert_eq!(
            dq.validity_flags,
            vec![ValidityFlag::Attention, ValidityFlag::Infrequency]
        );
        assert_eq!(dq.infrequency_hits, 2);
        assert_eq!(dq.confidence_band, ConfidenceBand::Low);
    }

    #[test]
    fn test_band_rules() {
        let config = DataQualityConfig::default();
        assert_eq!(confidence_band(&[], &config), ConfidenceBand::High);
        assert_eq!(
            confidence_band(&[ValidityFlag::StraightlineCaution], &config),
            ConfidenceBand::Moderate
        );
        assert_eq!(
            confidence_band(&[ValidityFlag::Partial], &config),
            ConfidenceBand::Low
        );
        assert_eq!(
            confidence_band(&[ValidityFlag::Speeding, ValidityFlag::FlatSubfacets], &config),
            ConfidenceBand::Low
        );
        assert_eq!(
            confidence_band(&[ValidityFlag::Speeding, ValidityFlag::SpeedCaution], &config),
            ConfidenceBand::Moderate
        );
        assert_eq!(
            confidence_band(&[ValidityFlag::Inconsistency], &config),
            ConfidenceBand::Low
        );
        assert_eq!(
            confidence_band(
                &[ValidityFlag::ImpressionManagement, ValidityFlag::StraightlineCaution],
                &config
            ),
            ConfidenceBand::Moderate
        );
        assert_eq!(
            confidence_band(&[ValidityFlag::Missingness, ValidityFlag::Attention], &config),
            ConfidenceBand::Low
        );
    }
}
