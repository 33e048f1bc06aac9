//! Core types for the assessment instrument.
//!
//! These types model the fixed structure of the instrument: nine rays, four
//! subfacets per ray, and the questions that measure them.
//!
//! With the `typescript` feature enabled, these types can be exported to TypeScript
//! using ts-rs for consistency with the web client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tools::Tool;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// One of the nine trainable capacity dimensions.
///
/// Ordering follows the ray number, so `R1 < R2 < ... < R9`. This is also the
/// lexicographic order of the identifiers and is used for deterministic
/// tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub enum RayId {
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
}

impl RayId {
    /// All rays in ascending order.
    pub const ALL: [RayId; 9] = [
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
        Self::R8,
        Self::R9,
    ];

    /// Ray number (1-9).
    pub fn number(&self) -> u8 {
        *self as u8 + 1
    }

    /// Look up a ray by its number.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1..=9 => Some(Self::ALL[(n - 1) as usize]),
            _ => None,
        }
    }

    /// Identifier as used on the wire (`"R1"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::R1 => "R1",
            Self::R2 => "R2",
            Self::R3 => "R3",
            Self::R4 => "R4",
            Self::R5 => "R5",
            Self::R6 => "R6",
            Self::R7 => "R7",
            Self::R8 => "R8",
            Self::R9 => "R9",
        }
    }

    /// Phase of the three-phase model this ray belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            Self::R1 | Self::R2 | Self::R3 => Phase::Reconnect,
            Self::R4 | Self::R5 | Self::R6 => Phase::Radiate,
            Self::R7 | Self::R8 | Self::R9 => Phase::Become,
        }
    }

    /// The four subfacets of this ray.
    pub fn subfacets(&self) -> [SubfacetId; 4] {
        SubfacetId::LETTERS.map(|letter| SubfacetId { ray: *self, letter })
    }
}

impl fmt::Display for RayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RayId {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self> {
        s.strip_prefix('R')
            .and_then(|n| n.parse::<u8>().ok())
            .and_then(Self::from_number)
            .ok_or_else(|| InstrumentError::Parse(format!("unknown ray id: {}", s)))
    }
}

/// The three-phase development model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Foundation rays: Intention, Joy, Presence
    Reconnect,
    /// Output rays: Power, Purpose, Authenticity
    Radiate,
    /// Expansion rays: Connection, Possibility, Be The Light
    Become,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reconnect => "Reconnect",
            Self::Radiate => "Radiate",
            Self::Become => "Become",
        }
    }
}

/// A subfacet of a ray, written `R1a` through `R9d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubfacetId {
    /// Owning ray
    pub ray: RayId,
    /// Subfacet letter (`a`-`d`)
    pub letter: char,
}

impl SubfacetId {
    /// Valid subfacet letters.
    pub const LETTERS: [char; 4] = ['a', 'b', 'c', 'd'];

    /// Build a subfacet id, rejecting letters outside `a`-`d`.
    pub fn new(ray: RayId, letter: char) -> Result<Self> {
        if Self::LETTERS.contains(&letter) {
            Ok(Self { ray, letter })
        } else {
            Err(InstrumentError::Parse(format!(
                "invalid subfacet letter '{}' for {}",
                letter, ray
            )))
        }
    }

    /// All 36 subfacets in ray-then-letter order.
    pub fn all() -> impl Iterator<Item = SubfacetId> {
        RayId::ALL.into_iter().flat_map(|ray| ray.subfacets())
    }
}

impl fmt::Display for SubfacetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.ray, self.letter)
    }
}

impl FromStr for SubfacetId {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self> {
        let letter = s
            .chars()
            .last()
            .ok_or_else(|| InstrumentError::Parse("empty subfacet id".to_string()))?;
        let ray: RayId = s[..s.len() - letter.len_utf8()].parse()?;
        Self::new(ray, letter)
    }
}

impl TryFrom<String> for SubfacetId {
    type Error = InstrumentError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SubfacetId> for String {
    fn from(value: SubfacetId) -> Self {
        value.to_string()
    }
}

/// Response scale of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Scale {
    pub min: i32,
    pub max: i32,
}

impl Scale {
    /// The 0-4 frequency scale (Never .. Almost always).
    pub const LIKERT: Scale = Scale { min: 0, max: 4 };

    pub fn contains(&self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Position of `value` within the scale, 0.0 at `min` and 1.0 at `max`.
    pub fn fraction(&self, value: i32) -> f64 {
        (f64::from(value) - f64::from(self.min)) / (f64::from(self.max) - f64::from(self.min))
    }

    /// Number of answer steps, `max - min`, computed without overflow.
    pub fn width(&self) -> i64 {
        i64::from(self.max) - i64::from(self.min)
    }

    /// Capacity reading of an answer in `[0, 1]`, with reverse keying applied.
    ///
    /// A reverse-keyed answer reads as its mirror across the midpoint, which
    /// is `1 - fraction`.
    pub fn reading(&self, polarity: Polarity, value: i32) -> f64 {
        let position = self.fraction(value);
        match polarity {
            Polarity::Normal => position,
            Polarity::Reverse => 1.0 - position,
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::LIKERT
    }
}

/// Framing of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum PressureMode {
    /// Capacity at rest; feeds the Shine score
    #[default]
    Baseline,
    /// Capacity under load; feeds the Access score
    UnderPressure,
}

impl PressureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::UnderPressure => "under_pressure",
        }
    }
}

/// Keying of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Higher answer = more capacity
    #[default]
    Normal,
    /// Higher answer = less capacity; scored `max + min - value`
    Reverse,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Reverse => "reverse",
        }
    }
}

/// Eclipse load dimension a question can indicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum LoadDimension {
    Emotional,
    Cognitive,
    Relational,
}

impl LoadDimension {
    pub const ALL: [LoadDimension; 3] = [Self::Emotional, Self::Cognitive, Self::Relational];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emotional => "emotional",
            Self::Cognitive => "cognitive",
            Self::Relational => "relational",
        }
    }
}

fn default_required() -> bool {
    true
}

/// A single item of the question manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Question {
    /// Stable question identifier
    pub id: String,
    /// Ray this question measures
    pub ray_id: RayId,
    /// Subfacet this question measures (must belong to `ray_id`)
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub subfacet_id: SubfacetId,
    /// Prompt text shown to the participant
    pub prompt: String,
    /// Allowed answer range
    #[serde(default)]
    pub scale: Scale,
    /// Baseline or under-pressure framing
    #[serde(default)]
    pub pressure_mode: PressureMode,
    /// Normal or reverse keying
    #[serde(default)]
    pub polarity: Polarity,
    /// Load dimension this question indicates, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_dimension: Option<LoadDimension>,
    /// Whether a full run must answer this question
    #[serde(default = "default_required")]
    pub required: bool,
}

impl Question {
    /// Capacity reading of an answer in `[0, 1]`, with reverse keying applied.
    pub fn reading(&self, value: i32) -> f64 {
        self.scale.reading(self.polarity, value)
    }
}

/// What a supplementary item measures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemPurpose {
    /// Use of a practice tool. Baseline items read usage, under-pressure
    /// items read access, reverse-keyed under-pressure items read distortion.
    Tool {
        #[cfg_attr(feature = "typescript", ts(type = "string"))]
        tool: Tool,
    },
    /// Endorsement of implausibly virtuous statements
    SocialDesirability,
    /// Instructed item with a single correct answer
    Attention { expected: i32 },
    /// Statement almost nobody can honestly endorse
    Infrequency,
    /// One half of a pair that should read alike after keying
    Consistency { pair: String },
}

impl ItemPurpose {
    /// Stable name used in fingerprints and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tool { .. } => "tool",
            Self::SocialDesirability => "social_desirability",
            Self::Attention { .. } => "attention",
            Self::Infrequency => "infrequency",
            Self::Consistency { .. } => "consistency",
        }
    }
}

/// An optional item outside the ray questions: tool usage or a validity check.
///
/// Supplementary items never feed ray scores and a full run may leave them
/// unanswered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct SupplementaryItem {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub scale: Scale,
    #[serde(default)]
    pub pressure_mode: PressureMode,
    #[serde(default)]
    pub polarity: Polarity,
    pub purpose: ItemPurpose,
}

impl SupplementaryItem {
    /// Capacity reading of an answer in `[0, 1]`, with reverse keying applied.
    pub fn reading(&self, value: i32) -> f64 {
        self.scale.reading(self.polarity, value)
    }

    /// Tool this item measures, if any.
    pub fn tool(&self) -> Option<Tool> {
        match self.purpose {
            ItemPurpose::Tool { tool } => Some(tool),
            _ => None,
        }
    }
}

/// Error types for instrument operations.
#[derive(Debug, thiserror::Error)]
pub enum InstrumentError {
    /// Reference file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reference data could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Reference data is structurally incomplete or inconsistent
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Loaded tables do not match the pinned fingerprint
    #[error("Fingerprint mismatch: expected {expected}, got {actual}")]
    FingerprintMismatch { expected: String, actual: String },
}

impl From<serde_json::Error> for InstrumentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for InstrumentError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InstrumentError>;
