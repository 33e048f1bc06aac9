//! Response intake.
//!
//! Checks a submitted packet against the question manifest and produces a
//! [`ResponseSet`] aligned with manifest order. Every problem in the packet is
//! collected into a single [`ValidationReport`] so the caller can re-prompt
//! once instead of failing on the first bad answer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::error::{OutOfRange, Result, ScoringError, ValidationReport};
use instrument::{
    LoadDimension, PressureMode, Question, QuestionManifest, SubfacetId, SupplementaryItem,
};

/// One submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Response {
    pub question_id: String,
    pub value: i32,
}

impl Response {
    pub fn new(question_id: impl Into<String>, value: i32) -> Self {
        Self {
            question_id: question_id.into(),
            value,
        }
    }
}

/// Product tier of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Every required question must be answered
    #[default]
    Full,
    /// Reduced question set; results are flagged as partial
    Preview,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Preview => "preview",
        }
    }
}

/// A run's raw submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ResponsePacket {
    pub run_id: String,
    #[serde(default)]
    pub tier: Tier,
    pub responses: Vec<Response>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ResponsePacket {
    /// Create a packet with a fresh run id.
    pub fn new(tier: Tier, responses: Vec<Response>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            tier,
            responses,
            started_at: None,
            completed_at: None,
        }
    }

    /// Attach start and completion timestamps.
    pub fn with_timing(mut self, started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self.completed_at = Some(completed_at);
        self
    }

    /// Completion time in seconds, when both timestamps are present and ordered.
    pub fn duration_secs(&self) -> Option<f64> {
        let (start, end) = (self.started_at?, self.completed_at?);
        let millis = (end - start).num_milliseconds();
        (millis > 0).then(|| millis as f64 / 1000.0)
    }
}

/// Validated answers aligned with manifest order.
///
/// Values cover questions first, then supplementary items.
#[derive(Debug, Clone)]
pub struct ResponseSet<'m> {
    manifest: &'m QuestionManifest,
    index: HashMap<&'m str, usize>,
    values: Vec<Option<i32>>,
    pub run_id: String,
    pub tier: Tier,
    pub duration_secs: Option<f64>,
}

impl<'m> ResponseSet<'m> {
    pub fn manifest(&self) -> &'m QuestionManifest {
        self.manifest
    }

    /// Answered questions in manifest order.
    pub fn answers(&self) -> impl Iterator<Item = (&'m Question, i32)> + '_ {
        let manifest = self.manifest;
        manifest
            .questions
            .iter()
            .zip(self.values.iter())
            .filter_map(|(q, v)| v.map(|value| (q, value)))
    }

    /// Answered supplementary items in manifest order.
    pub fn supplementary_answers(&self) -> impl Iterator<Item = (&'m SupplementaryItem, i32)> + '_ {
        let manifest = self.manifest;
        manifest
            .supplementary
            .iter()
            .zip(self.values[manifest.len()..].iter())
            .filter_map(|(s, v)| v.map(|value| (s, value)))
    }

    /// Answer to a question or supplementary item, if given.
    pub fn value(&self, item_id: &str) -> Option<i32> {
        self.index.get(item_id).and_then(|&i| self.values[i])
    }

    pub fn answered_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_partial(&self) -> bool {
        self.tier == Tier::Preview
    }
}

/// Validate a packet against the manifest.
pub fn validate<'m>(
    manifest: &'m QuestionManifest,
    packet: &ResponsePacket,
) -> Result<ResponseSet<'m>> {
    let index = manifest.index();
    let scales: Vec<_> = manifest.items().collect();
    let mut values: Vec<Option<i32>> = vec![None; scales.len()];
    let mut seen = vec![false; scales.len()];
    let mut report = ValidationReport::default();
    let mut reported_unknown = HashSet::new();
    let mut reported_duplicate = HashSet::new();

    for response in &packet.responses {
        let Some(&position) = index.get(response.question_id.as_str()) else {
            if reported_unknown.insert(response.question_id.as_str()) {
                report.unknown.push(response.question_id.clone());
            }
            continue;
        };

        if seen[position] {
            if reported_duplicate.insert(position) {
                report.duplicate.push(response.question_id.clone());
            }
            values[position] = None;
            continue;
        }
        seen[position] = true;

        let (id, scale) = scales[position];
        if scale.contains(response.value) {
            values[position] = Some(response.value);
        } else {
            report.out_of_range.push(OutOfRange {
                question_id: id.to_string(),
                value: response.value,
                min: scale.min,
                max: scale.max,
            });
        }
    }

    if packet.tier == Tier::Full {
        report.missing = manifest
            .questions
            .iter()
            .zip(seen.iter())
            .filter(|(q, seen)| q.required && !**seen)
            .map(|(q, _)| q.id.clone())
            .collect();
    }

    // Coverage only matters once the answers themselves are sound.
    if report.is_empty() {
        check_coverage(manifest, &values, &mut report);
    }

    if !report.is_empty() {
        tracing::warn!(
            run_id = %packet.run_id,
            tier = packet.tier.as_str(),
            problems = report.problem_count(),
            "Response packet rejected"
        );
        return Err(ScoringError::Validation(report));
    }

    let set = ResponseSet {
        manifest,
        index,
        values,
        run_id: packet.run_id.clone(),
        tier: packet.tier,
        duration_secs: packet.duration_secs(),
    };

    tracing::debug!(
        run_id = %set.run_id,
        answered = set.answered_count(),
        "Response packet accepted"
    );

    Ok(set)
}

fn check_coverage(
    manifest: &QuestionManifest,
    values: &[Option<i32>],
    report: &mut ValidationReport,
) {
    let answered = || {
        manifest
            .questions
            .iter()
            .zip(values.iter())
            .filter(|(_, v)| v.is_some())
            .map(|(q, _)| q)
    };

    let covered: HashSet<SubfacetId> = answered()
        .filter(|q| q.pressure_mode == PressureMode::Baseline)
        .map(|q| q.subfacet_id)
        .collect();
    report.uncovered_subfacets = SubfacetId::all()
        .filter(|s| !covered.contains(s))
        .map(|s| s.to_string())
        .collect();

    let dimensions: HashSet<LoadDimension> =
        answered().filter_map(|q| q.load_dimension).collect();
    report.uncovered_dimensions = LoadDimension::ALL
        .iter()
        .filter(|d| !dimensions.contains(d))
        .map(|d| d.as_str().to_string())
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::TimeZone;

    fn full_packet(manifest: &QuestionManifest, value: i32) -> ResponsePacket {
        let responses = manifest
            .questions
            .iter()
            .map(|q| Response::new(q.id.clone(), value))
            .collect();
        ResponsePacket::new(Tier::Full, responses)
    }

    #[test]
    fn test_accepts_complete_packet() {
        let manifest = QuestionManifest::standard();
        let packet = full_packet(&manifest, 3);
        let set = validate(&manifest, &packet).unwrap();
        assert_eq!(set.answered_count(), 143);
        assert_eq!(set.value("Q010"), Some(3));
        assert!(!set.is_partial());
        assert!(set.duration_secs.is_none());
    }

    #[test]
    fn test_missing_question_is_named() {
        let manifest = QuestionManifest::standard();
        let mut packet = full_packet(&manifest, 2);
        packet.responses.retain(|r| r.question_id != "Q042");

        let err = validate(&manifest, &packet).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.report().unwrap().missing, vec!["Q042".to_string()]);
    }

    #[test]
    fn test_out_of_range_values() {
        let manifest = QuestionManifest::standard();
        let mut packet = full_packet(&manifest, 2);
        packet.responses[0].value = -1;
        packet.responses[1].value = 5;

        let err = validate(&manifest, &packet).unwrap_err();
        let report = err.report().unwrap();
        assert_eq!(report.out_of_range.len(), 2);
        assert_eq!(report.out_of_range[0].question_id, "Q001");
        assert_eq!(report.out_of_range[1].value, 5);
    }

    #[test]
    fn test_duplicates_and_unknowns_collected_together() {
        let manifest = QuestionManifest::standard();
        let mut packet = full_packet(&manifest, 1);
        packet.responses.push(Response::new("Q003", 2));
        packet.responses.push(Response::new("Q003", 4));
        packet.responses.push(Response::new("Q900", 1));
        packet.responses.push(Response::new("Q900", 1));

        let err = validate(&manifest, &packet).unwrap_err();
        let report = err.report().unwrap();
        assert_eq!(report.duplicate, vec!["Q003".to_string()]);
        assert_eq!(report.unknown, vec!["Q900".to_string()]);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_preview_tier_requires_coverage() {
        let manifest = QuestionManifest::standard();

        // First baseline item of every subfacet plus the load indicators.
        let mut seen = HashSet::new();
        let responses: Vec<Response> = manifest
            .questions
            .iter()
            .filter(|q| q.load_dimension.is_some() || seen.insert(q.subfacet_id))
            .map(|q| Response::new(q.id.clone(), 3))
            .collect();
        let packet = ResponsePacket::new(Tier::Preview, responses.clone());
        let set = validate(&manifest, &packet).unwrap();
        assert!(set.is_partial());
        assert_eq!(set.answered_count(), 45);

        // Dropping R2a's only answer leaves it uncovered.
        let trimmed: Vec<Response> = responses
            .into_iter()
            .filter(|r| manifest.get(&r.question_id).unwrap().subfacet_id.to_string() != "R2a")
            .collect();
        let err = validate(&manifest, &ResponsePacket::new(Tier::Preview, trimmed)).unwrap_err();
        assert_eq!(err.report().unwrap().uncovered_subfacets, vec!["R2a".to_string()]);
    }

    #[test]
    fn test_supplementary_answers_are_optional() {
        let manifest = QuestionManifest::standard();
        let mut packet = full_packet(&manifest, 2);
        let set = validate(&manifest, &packet).unwrap();
        assert_eq!(set.supplementary_answers().count(), 0);

        packet.responses.push(Response::new("VATT2", 4));
        packet.responses.push(Response::new("T003-7", 1));
        let set = validate(&manifest, &packet).unwrap();
        assert_eq!(set.value("VATT2"), Some(4));
        assert_eq!(set.answers().count(), 143);
        let ids: Vec<&str> = set.supplementary_answers().map(|(s, _)| s.id.as_str()).collect();
        assert_eq!(ids, vec!["T003-7", "VATT2"]);
    }

    #[test]
    fn test_supplementary_range_is_checked() {
        let manifest = QuestionManifest::standard();
        let mut packet = full_packet(&manifest, 2);
        packet.responses.push(Response::new("VSD1", 9));

        let err = validate(&manifest, &packet).unwrap_err();
        let report = err.report().unwrap();
        assert_eq!(report.out_of_range.len(), 1);
        assert_eq!(report.out_of_range[0].question_id, "VSD1");
        assert_eq!(report.out_of_range[0].max, 4);
    }

    #[test]
    fn test_duration() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 1, 9, 14, 30).unwrap();
        let packet = ResponsePacket::new(Tier::Full, vec![]).with_timing(start, end);
        assert_eq!(packet.duration_secs(), Some(870.0));

        let backwards = ResponsePacket::new(Tier::Full, vec![]).with_timing(end, start);
        assert_eq!(backwards.duration_secs(), None);
    }

    #[test]
    fn test_packet_json() {
        let json = r#"{"run_id":"run-1","responses":[{"question_id":"Q001","value":4}]}"#;
        let packet: ResponsePacket = serde_json::from_str(json).unwrap();
        assert_eq!(packet.tier, Tier::Full);
        assert_eq!(packet.responses[0], Response::new("Q001", 4));
    }
}
