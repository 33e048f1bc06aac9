//! Wire types of the assessment output.
//!
//! Everything here serializes into the `AssessmentOutputV1` JSON contract.
//! Changes must be additive.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use instrument::{Phase, RayId, SubfacetId};

/// How a ray behaves under load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EclipseModifier {
    /// Holds steady under stress
    None,
    /// Over-used under stress
    Amplified,
    /// Drops out under stress
    Muted,
}

/// Score of one subfacet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct SubfacetOutput {
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub subfacet_id: SubfacetId,
    pub label: String,
    /// Baseline capacity (0-100)
    pub score: f64,
    /// Capacity under pressure (0-100), when the subfacet has such items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_score: Option<f64>,
}

/// Scores of one ray.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct RayOutput {
    pub ray_id: RayId,
    pub ray_name: String,
    pub phase: Phase,
    /// Shine (0-100)
    pub score: f64,
    /// Access (0-100)
    pub access_score: f64,
    /// Eclipse (0-100)
    pub eclipse_score: f64,
    /// `clamp((score - eclipse_score + 100) / 2, 0, 100)`
    pub net_energy: f64,
    pub eclipse_modifier: EclipseModifier,
    #[cfg_attr(feature = "typescript", ts(type = "Record<string, SubfacetOutput>"))]
    pub subfacets: BTreeMap<SubfacetId, SubfacetOutput>,
}

/// Overall eclipse level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EclipseLevel {
    Low,
    Moderate,
    Elevated,
    High,
}

impl EclipseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::Elevated => "ELEVATED",
            Self::High => "HIGH",
        }
    }
}

/// One load dimension on the 0-4 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DimensionScore {
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EclipseDimensions {
    pub emotional_load: DimensionScore,
    pub cognitive_load: DimensionScore,
    pub relational_load: DimensionScore,
}

/// Indices derived from load dimensions and ray totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DerivedMetrics {
    /// 100 - load pressure
    pub recovery_access: f64,
    /// Mean load dimension rescaled to 0-100
    pub load_pressure: f64,
    /// Energy efficiency ratio
    pub eer: f64,
    /// Burnout risk index: rays where eclipse exceeds shine
    pub bri: usize,
    /// Performance-presence delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_presence_delta: Option<f64>,
}

/// Recommended intensity of follow-up practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatingMode {
    Stabilize,
    BuildRange,
    Stretch,
}

impl GatingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stabilize => "STABILIZE",
            Self::BuildRange => "BUILD_RANGE",
            Self::Stretch => "STRETCH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Gating {
    pub mode: GatingMode,
    /// Deterministic sentence naming the triggering metric
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EclipseOutput {
    pub level: EclipseLevel,
    pub dimensions: EclipseDimensions,
    pub derived_metrics: DerivedMetrics,
    pub gating: Gating,
}

/// Reference to a ray in summary sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct RayRef {
    pub ray_id: RayId,
    pub ray_name: String,
    pub net_energy: f64,
    /// How this ray tends to distort when load runs high
    #[serde(default)]
    pub under_load_distortion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ArchetypeRef {
    /// Canonical pair code, e.g. `R5-R7`
    pub pair_code: String,
    pub name: String,
    pub essence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct LightSignature {
    pub top_two: [RayRef; 2],
    /// Lowest-ranked ray (the Rise Path)
    pub just_in_ray: RayRef,
    pub archetype: ArchetypeRef,
    /// Second/third or last two ranks nearly tied
    pub close_call: bool,
    /// Net energies barely differ across rays
    pub flat_profile: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActingStatus {
    Clear,
    Watch,
    Flagged,
}

/// How assertively the report may phrase findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LanguageMode {
    Standard,
    Directional,
    ValidationRequired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ActingVsCapacity {
    pub status: ActingStatus,
    /// Output-ray Shine minus grounding-ray Access
    pub delta: f64,
    pub indicators: Vec<String>,
    pub report_language_mode: LanguageMode,
    pub next_step: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceBand {
    High,
    Moderate,
    Low,
}

/// Response-pattern flag raised against a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidityFlag {
    Straightlining,
    StraightlineCaution,
    LowVariance,
    FlatSubfacets,
    Speeding,
    SpeedCaution,
    Partial,
    /// Social desirability elevated but not extreme
    ImpressionManagement,
    /// Social desirability extreme
    SocialDesirability,
    /// Too many consistency pairs disagree
    Inconsistency,
    /// Too many attention items missed
    Attention,
    /// Too many implausible statements endorsed
    Infrequency,
    /// Too many subfacets answered thinly
    Missingness,
}

impl ValidityFlag {
    /// Hard flags count toward a LOW band; cautions only lower it to MODERATE.
    pub fn is_hard(&self) -> bool {
        !matches!(
            self,
            Self::StraightlineCaution | Self::SpeedCaution | Self::ImpressionManagement
        )
    }

    /// Flags that force a LOW band on their own.
    pub fn is_decisive(&self) -> bool {
        matches!(
            self,
            Self::Straightlining
                | Self::LowVariance
                | Self::Partial
                | Self::SocialDesirability
                | Self::Inconsistency
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DataQuality {
    pub confidence_band: ConfidenceBand,
    pub validity_flags: Vec<ValidityFlag>,
    /// Longest run of identical consecutive answers
    pub longest_identical_run: usize,
    /// SD of answers on the 0-4 scale
    pub response_sd: f64,
    /// SD across subfacet scores
    pub subfacet_sd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// Mean endorsement of social-desirability items (0-4), when answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_desirability: Option<f64>,
    /// Consistency pairs whose readings diverge
    #[serde(default)]
    pub inconsistent_pairs: usize,
    /// Attention items answered against their instruction
    #[serde(default)]
    pub attention_misses: usize,
    /// Implausible statements endorsed
    #[serde(default)]
    pub infrequency_hits: usize,
    /// Subfacets with too few answered items
    #[serde(default)]
    pub low_coverage_subfacets: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quality_notes: Vec<String>,
}

impl DataQuality {
    pub fn has_flag(&self, flag: ValidityFlag) -> bool {
        self.validity_flags.contains(&flag)
    }

    /// Social desirability at or above the elevated threshold.
    pub fn sd_elevated(&self) -> bool {
        self.has_flag(ValidityFlag::ImpressionManagement)
            || self.has_flag(ValidityFlag::SocialDesirability)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityMode {
    ToolsFirst,
    ToolsAndReps,
    RepsOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ToolRecommendation {
    /// Catalog id, `T001` through `T012`
    pub tool_id: String,
    pub name: String,
    pub why_now: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct WeeklyFocus {
    pub just_in_ray_id: RayId,
    pub focus_rep: String,
    pub minimum_effective_dose: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Recommendations {
    pub priority_mode: PriorityMode,
    pub tools: Vec<ToolRecommendation>,
    pub weekly_focus: WeeklyFocus,
    pub coaching_questions: Vec<String>,
    pub what_not_to_do_yet: Vec<String>,
}

/// Known interpretation hazards, always reported in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeCaseCode {
    ExpensiveStrength,
    TruthDetectorSuppressed,
    PerfectSelfReport,
    ContradictoryResponses,
    FlatProfile,
    CloseCall,
    PartialCompletion,
    ExtremePolarization,
    HighLoadInterference,
    UnresolvedAmbiguity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EdgeCase {
    pub code: EdgeCaseCode,
    pub detected: bool,
    /// What the report must suppress or soften; empty when not detected
    pub restriction: String,
    /// Evidence that would resolve the case; empty when not detected
    pub required_next_evidence: String,
}

/// Usage, access and distortion of one practice tool, each on 0-4.
///
/// A reading is `None` when too few of its items were answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ToolComposite {
    /// Catalog id, `T001` through `T012`
    pub tool_id: String,
    pub name: String,
    /// Use at baseline
    pub usage: Option<f64>,
    /// Use under pressure
    pub access: Option<f64>,
    /// Misuse under pressure
    pub distortion: Option<f64>,
    /// Items in the manifest for this tool
    pub item_count: usize,
    /// Share of those items answered
    pub coverage: f64,
}

/// Strength of an executive signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalLevel {
    Low,
    Moderate,
    Elevated,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum SignalCategory {
    /// Capacity signals M001-M018
    #[serde(rename = "CORE_18")]
    Core,
    /// Organisational outcome signals M019-M024
    #[serde(rename = "EXEC_6")]
    Executive,
}

/// Leadership signal derived from ray and tool readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ExecutiveSignal {
    /// `M001` through `M024`
    pub signal_id: String,
    pub label: String,
    pub category: SignalCategory,
    pub level: SignalLevel,
    pub confidence_band: ConfidenceBand,
    /// Predictor rays and tools, e.g. `Rays: R1, R5`
    pub drivers: Vec<String>,
    /// Validity caveats on the reading
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moderators: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileFlag {
    Standard,
    Partial,
    Undifferentiated,
}
