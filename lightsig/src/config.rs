//! Configuration for the scoring engine.
//!
//! Defaults hold the documented constants of instrument v1. Deployments may
//! override any section from YAML, but thresholds are validated before an
//! engine will accept them.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoringError};
use instrument::{LoadDimension, Phase};

/// Configuration for a scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScoringConfig {
    /// Ray aggregation settings
    pub aggregation: AggregationConfig,
    /// Eclipse level and gating settings
    pub eclipse: EclipseConfig,
    /// Performance-presence delta settings
    pub signals: SignalsConfig,
    /// Response-pattern heuristics
    pub data_quality: DataQualityConfig,
    /// Archetype resolution settings
    pub signature: SignatureConfig,
    /// Tool composite settings
    pub tools: ToolsConfig,
    /// Executive signal banding
    pub executive: ExecutiveConfig,
}

impl ScoringConfig {
    /// Load config from YAML. Missing sections fall back to defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| ScoringError::Configuration(format!("invalid scoring config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ScoringError::Configuration(format!("cannot encode scoring config: {}", e)))
    }

    /// Reject inconsistent thresholds.
    pub fn validate(&self) -> Result<()> {
        self.aggregation.validate()?;
        self.eclipse.validate()?;
        self.signals.validate()?;
        self.data_quality.validate()?;
        self.signature.validate()?;
        self.tools.validate()?;
        self.executive.validate()
    }
}

fn invalid(msg: impl Into<String>) -> ScoringError {
    ScoringError::Configuration(msg.into())
}

fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{} must be finite", name)))
    }
}

/// Relative weight of each load dimension within one phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionWeights {
    pub emotional: f64,
    pub cognitive: f64,
    pub relational: f64,
}

impl DimensionWeights {
    pub fn weight(&self, dimension: LoadDimension) -> f64 {
        match dimension {
            LoadDimension::Emotional => self.emotional,
            LoadDimension::Cognitive => self.cognitive,
            LoadDimension::Relational => self.relational,
        }
    }

    fn validate(&self, phase: &str) -> Result<()> {
        let weights = [self.emotional, self.cognitive, self.relational];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(invalid(format!(
                "{} phase weights must be non-negative",
                phase
            )));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(invalid(format!(
                "{} phase weights must sum to 1, got {}",
                phase, sum
            )));
        }
        Ok(())
    }
}

/// Load-dimension weights per phase, used to derive ray Eclipse scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseWeights {
    pub reconnect: DimensionWeights,
    pub radiate: DimensionWeights,
    pub r#become: DimensionWeights,
}

impl PhaseWeights {
    pub fn for_phase(&self, phase: Phase) -> &DimensionWeights {
        match phase {
            Phase::Reconnect => &self.reconnect,
            Phase::Radiate => &self.radiate,
            Phase::Become => &self.r#become,
        }
    }
}

impl Default for PhaseWeights {
    fn default() -> Self {
        Self {
            // Foundation rays erode first under emotional load
            reconnect: DimensionWeights {
                emotional: 0.5,
                cognitive: 0.3,
                relational: 0.2,
            },
            radiate: DimensionWeights {
                emotional: 0.3,
                cognitive: 0.4,
                relational: 0.3,
            },
            r#become: DimensionWeights {
                emotional: 0.2,
                cognitive: 0.3,
                relational: 0.5,
            },
        }
    }
}

/// Ray aggregation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Share of Shine lost at full load pressure when a ray has no
    /// under-pressure answers (0.0 - 1.0)
    pub stress_discount: f64,
    /// Access above Shine by more than this marks a ray AMPLIFIED
    pub amplified_margin: f64,
    /// Eclipse above Shine by more than this marks a ray MUTED
    pub muted_margin: f64,
    /// Phase weights for ray Eclipse
    pub phase_weights: PhaseWeights,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            stress_discount: 0.5,
            amplified_margin: 20.0,
            muted_margin: 20.0,
            phase_weights: PhaseWeights::default(),
        }
    }
}

impl AggregationConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.stress_discount) {
            return Err(invalid("aggregation.stress_discount must be within 0..1"));
        }
        for (name, margin) in [
            ("aggregation.amplified_margin", self.amplified_margin),
            ("aggregation.muted_margin", self.muted_margin),
        ] {
            ensure_finite(name, margin)?;
            if !(0.0..=100.0).contains(&margin) {
                return Err(invalid(format!("{} must be within 0..100", name)));
            }
        }
        self.phase_weights.reconnect.validate("reconnect")?;
        self.phase_weights.radiate.validate("radiate")?;
        self.phase_weights.r#become.validate("become")
    }
}

/// Load-pressure breakpoints for the eclipse level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelThresholds {
    /// Load pressure at or above this is MODERATE
    pub moderate: f64,
    /// Load pressure at or above this is ELEVATED
    pub elevated: f64,
    /// Load pressure at or above this is HIGH
    pub high: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            moderate: 25.0,
            elevated: 50.0,
            high: 75.0,
        }
    }
}

/// Eclipse level and gating configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EclipseConfig {
    pub levels: LevelThresholds,
    /// BRI at or above this forces STABILIZE
    pub stabilize_bri: usize,
    /// EER at or above this (with LOW level) allows STRETCH
    pub stretch_eer: f64,
    /// EER below this counts as burnout risk for edge cases
    pub burnout_eer: f64,
}

impl Default for EclipseConfig {
    fn default() -> Self {
        Self {
            levels: LevelThresholds::default(),
            stabilize_bri: 3,
            stretch_eer: 1.5,
            burnout_eer: 0.8,
        }
    }
}

impl EclipseConfig {
    fn validate(&self) -> Result<()> {
        let LevelThresholds {
            moderate,
            elevated,
            high,
        } = self.levels;
        ensure_finite("eclipse.levels.moderate", moderate)?;
        ensure_finite("eclipse.levels.high", high)?;
        if !(0.0 < moderate && moderate < elevated && elevated < high && high <= 100.0) {
            return Err(invalid(
                "eclipse level thresholds must be strictly increasing within 0..100",
            ));
        }
        if self.stabilize_bri == 0 || self.stabilize_bri > 9 {
            return Err(invalid("eclipse.stabilize_bri must be within 1..9"));
        }
        ensure_finite("eclipse.stretch_eer", self.stretch_eer)?;
        ensure_finite("eclipse.burnout_eer", self.burnout_eer)?;
        if self.stretch_eer <= 0.0 || self.burnout_eer <= 0.0 {
            return Err(invalid("eclipse EER thresholds must be positive"));
        }
        Ok(())
    }
}

/// Performance-presence delta configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    /// Gap above this is WATCH
    pub watch_gap: f64,
    /// Gap above this is FLAGGED
    pub flagged_gap: f64,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            watch_gap: 15.0,
            flagged_gap: 30.0,
        }
    }
}

impl SignalsConfig {
    fn validate(&self) -> Result<()> {
        ensure_finite("signals.watch_gap", self.watch_gap)?;
        ensure_finite("signals.flagged_gap", self.flagged_gap)?;
        if !(0.0 <= self.watch_gap && self.watch_gap < self.flagged_gap) {
            return Err(invalid("signals.watch_gap must be below signals.flagged_gap"));
        }
        Ok(())
    }
}

/// Response-pattern heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataQualityConfig {
    /// Identical consecutive answers that flag straight-lining
    pub straightline_run: usize,
    /// Identical consecutive answers that raise a caution
    pub straightline_caution_run: usize,
    /// Answer SD (0-4 scale) below this flags inattentive responding
    pub low_variance_sd: f64,
    /// SD across subfacet scores (0-100) below this flags a flat profile
    pub flat_subfacet_sd: f64,
    /// Completion faster than this is always speeding (seconds)
    pub min_duration_secs: f64,
    /// Median completion time observed in the pilot (seconds)
    pub pilot_median_secs: Option<f64>,
    /// Fraction of the pilot median below which a run is speeding
    pub speeding_fraction: f64,
    /// Fraction of the pilot median below which a run is cautioned
    pub speed_caution_fraction: f64,
    /// Hard flags that together force a LOW band
    pub low_band_hard_flags: usize,
    /// Mean social-desirability endorsement (0-4) that counts as elevated
    pub sd_elevated: f64,
    /// Mean social-desirability endorsement (0-4) that counts as extreme
    pub sd_extreme: f64,
    /// Reading gap (0-4) at which a consistency pair disagrees
    pub inconsistency_pair_diff: f64,
    /// Disagreeing pairs that flag inconsistency
    pub inconsistency_flag_pairs: usize,
    /// Missed attention items that raise a flag
    pub attention_flag_misses: usize,
    /// Answer (0-4) at which an infrequency item counts as endorsed
    pub infrequency_endorse: f64,
    /// Endorsed infrequency items that raise a flag
    pub infrequency_flag_hits: usize,
    /// Share of a subfacet's items that must be answered
    pub subfacet_coverage: f64,
    /// Thinly answered subfacets that flag missingness
    pub missingness_subfacets: usize,
}

impl Default for DataQualityConfig {
    fn default() -> Self {
        Self {
            straightline_run: 18,
            straightline_caution_run: 12,
            low_variance_sd: 0.35,
            flat_subfacet_sd: 5.0,
            min_duration_secs: 360.0,
            pilot_median_secs: None,
            speeding_fraction: 0.25,
            speed_caution_fraction: 0.45,
            low_band_hard_flags: 2,
            sd_elevated: 3.2,
            sd_extreme: 3.6,
            inconsistency_pair_diff: 3.0,
            inconsistency_flag_pairs: 2,
            attention_flag_misses: 2,
            infrequency_endorse: 3.0,
            infrequency_flag_hits: 2,
            subfacet_coverage: 0.60,
            missingness_subfacets: 6,
        }
    }
}

impl DataQualityConfig {
    fn validate(&self) -> Result<()> {
        if self.straightline_caution_run < 2 || self.straightline_caution_run >= self.straightline_run {
            return Err(invalid(
                "data_quality.straightline_caution_run must be at least 2 and below straightline_run",
            ));
        }
        ensure_finite("data_quality.low_variance_sd", self.low_variance_sd)?;
        ensure_finite("data_quality.flat_subfacet_sd", self.flat_subfacet_sd)?;
        ensure_finite("data_quality.min_duration_secs", self.min_duration_secs)?;
        if let Some(median) = self.pilot_median_secs {
            if !median.is_finite() || median <= 0.0 {
                return Err(invalid("data_quality.pilot_median_secs must be positive"));
            }
        }
        if !(0.0 < self.speeding_fraction
            && self.speeding_fraction < self.speed_caution_fraction
            && self.speed_caution_fraction <= 1.0)
        {
            return Err(invalid(
                "data_quality speed fractions must satisfy 0 < speeding < caution <= 1",
            ));
        }
        if self.low_band_hard_flags == 0 {
            return Err(invalid("data_quality.low_band_hard_flags must be positive"));
        }
        ensure_finite("data_quality.sd_elevated", self.sd_elevated)?;
        ensure_finite("data_quality.sd_extreme", self.sd_extreme)?;
        if !(0.0 < self.sd_elevated && self.sd_elevated <= self.sd_extreme && self.sd_extreme <= 4.0) {
            return Err(invalid(
                "data_quality social desirability thresholds must satisfy 0 < elevated <= extreme <= 4",
            ));
        }
        for (name, value) in [
            ("data_quality.inconsistency_pair_diff", self.inconsistency_pair_diff),
            ("data_quality.infrequency_endorse", self.infrequency_endorse),
        ] {
            ensure_finite(name, value)?;
            if !(0.0 < value && value <= 4.0) {
                return Err(invalid(format!("{} must be within 0..4", name)));
            }
        }
        for (name, count) in [
            ("data_quality.inconsistency_flag_pairs", self.inconsistency_flag_pairs),
            ("data_quality.attention_flag_misses", self.attention_flag_misses),
            ("data_quality.infrequency_flag_hits", self.infrequency_flag_hits),
            ("data_quality.missingness_subfacets", self.missingness_subfacets),
        ] {
            if count == 0 {
                return Err(invalid(format!("{} must be positive", name)));
            }
        }
        if !(0.0..=1.0).contains(&self.subfacet_coverage) {
            return Err(invalid("data_quality.subfacet_coverage must be within 0..1"));
        }
        Ok(())
    }
}

/// Archetype resolution configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Net-energy gap (points) treated as a near tie
    pub close_call_gap: f64,
    /// SD of net energies below which the profile is flat
    pub flat_profile_sd: f64,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            close_call_gap: 2.0,
            flat_profile_sd: 5.0,
        }
    }
}

impl SignatureConfig {
    fn validate(&self) -> Result<()> {
        ensure_finite("signature.close_call_gap", self.close_call_gap)?;
        ensure_finite("signature.flat_profile_sd", self.flat_profile_sd)?;
        if self.close_call_gap < 0.0 || self.flat_profile_sd < 0.0 {
            return Err(invalid("signature thresholds must be non-negative"));
        }
        Ok(())
    }
}

/// Tool composite configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Fewest answered items a reading may rest on
    pub min_items: usize,
    /// Share of a bucket's items that must be answered
    pub usable_fraction: f64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            min_items: 3,
            usable_fraction: 0.40,
        }
    }
}

impl ToolsConfig {
    /// Answered items needed before a bucket of `total` items yields a reading.
    pub fn threshold(&self, total: usize) -> f64 {
        (self.min_items as f64).max(self.usable_fraction * total as f64)
    }

    fn validate(&self) -> Result<()> {
        if self.min_items == 0 {
            return Err(invalid("tools.min_items must be positive"));
        }
        if !(0.0..=1.0).contains(&self.usable_fraction) {
            return Err(invalid("tools.usable_fraction must be within 0..1"));
        }
        Ok(())
    }
}

/// Breakpoints (0-4) between executive signal levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutiveConfig {
    /// Base at or above this is MODERATE
    pub moderate: f64,
    /// Base at or above this is ELEVATED
    pub elevated: f64,
    /// Base at or above this is HIGH
    pub high: f64,
}

impl Default for ExecutiveConfig {
    fn default() -> Self {
        Self {
            moderate: 1.5,
            elevated: 2.5,
            high: 3.5,
        }
    }
}

impl ExecutiveConfig {
    fn validate(&self) -> Result<()> {
        ensure_finite("executive.moderate", self.moderate)?;
        ensure_finite("executive.high", self.high)?;
        if !(0.0 < self.moderate && self.moderate < self.elevated && self.elevated < self.high && self.high <= 4.0) {
            return Err(invalid(
                "executive thresholds must be strictly increasing within 0..4",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScoringConfig::default();
        config.validate().unwrap();
        assert_eq!(config.eclipse.levels.elevated, 50.0);
        assert_eq!(config.data_quality.straightline_run, 18);
        assert_eq!(config.data_quality.attention_flag_misses, 2);
        assert_eq!(config.data_quality.infrequency_flag_hits, 2);
        assert_eq!(config.data_quality.inconsistency_flag_pairs, 2);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = ScoringConfig::default();
        let yaml = config.to_yaml().unwrap();
        let parsed = ScoringConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "signals:\n  watch_gap: 10.0\n  flagged_gap: 25.0\n";
        let config = ScoringConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.signals.watch_gap, 10.0);
        assert_eq!(config.aggregation, AggregationConfig::default());
    }

    #[test]
    fn test_rejects_unordered_levels() {
        let mut config = ScoringConfig::default();
        config.eclipse.levels.elevated = 20.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ScoringError::Configuration(_)));
    }

    #[test]
    fn test_rejects_bad_phase_weights() {
        let mut config = ScoringConfig::default();
        config.aggregation.phase_weights.radiate.cognitive = 0.9;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("radiate"));
    }

    #[test]
    fn test_rejects_inverted_gaps() {
        let yaml = "signals:\n  watch_gap: 40.0\n  flagged_gap: 30.0\n";
        assert!(ScoringConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_rejects_inverted_social_desirability() {
        let mut config = ScoringConfig::default();
        config.data_quality.sd_elevated = 3.8;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("social desirability"));
    }

    #[test]
    fn test_tool_threshold() {
        let tools = ToolsConfig::default();
        assert_eq!(tools.threshold(3), 3.0);
        assert_eq!(tools.threshold(10), 4.0);

        let yaml = "tools:\n  min_items: 0\n";
        assert!(ScoringConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_rejects_unordered_executive_bands() {
        let yaml = "executive:\n  moderate: 1.5\n  elevated: 3.6\n  high: 3.5\n";
        assert!(ScoringConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_phase_lookup() {
        let weights = PhaseWeights::default();
        assert_eq!(
            weights.for_phase(Phase::Become).weight(LoadDimension::Relational),
            0.5
        );
    }
}
