//! Light Signature archetype table.
//!
//! Each unordered pair of distinct rays maps to exactly one named archetype.
//! With nine rays there are C(9,2) = 36 pairs, and a table is only accepted
//! when it covers all of them exactly once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::types::{InstrumentError, RayId, Result};

/// Number of unordered ray pairs.
pub const PAIR_COUNT: usize = 36;

/// Canonical unordered pair of distinct rays, stored low-then-high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArchetypePair {
    low: RayId,
    high: RayId,
}

impl ArchetypePair {
    /// Canonicalize two rays into a pair. Order of arguments does not matter.
    pub fn new(a: RayId, b: RayId) -> Result<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Ok(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Ok(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => Err(InstrumentError::Configuration(format!(
                "archetype pair needs two distinct rays, got {} twice",
                a
            ))),
        }
    }

    pub fn low(&self) -> RayId {
        self.low
    }

    pub fn high(&self) -> RayId {
        self.high
    }

    /// Wire code, e.g. `R5-R7`.
    pub fn code(&self) -> String {
        self.to_string()
    }

    /// All 36 pairs in canonical order.
    pub fn all() -> impl Iterator<Item = ArchetypePair> {
        RayId::ALL.into_iter().enumerate().flat_map(|(i, low)| {
            RayId::ALL[i + 1..]
                .iter()
                .map(move |&high| ArchetypePair { low, high })
        })
    }
}

impl fmt::Display for ArchetypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

impl FromStr for ArchetypePair {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self> {
        let (a, b) = s
            .split_once('-')
            .ok_or_else(|| InstrumentError::Parse(format!("invalid pair code: {}", s)))?;
        Self::new(a.parse()?, b.parse()?)
    }
}

impl TryFrom<String> for ArchetypePair {
    type Error = InstrumentError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ArchetypePair> for String {
    fn from(value: ArchetypePair) -> Self {
        value.to_string()
    }
}

/// A named Light Signature archetype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Archetype {
    /// Canonical ray pair
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub pair: ArchetypePair,
    /// Display name
    pub name: String,
    /// One-sentence essence used on share cards and the report header
    pub essence: String,
}

/// Complete, validated archetype table.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchetypeTable {
    entries: BTreeMap<ArchetypePair, Archetype>,
}

impl ArchetypeTable {
    /// Build a table, requiring every pair exactly once.
    pub fn from_entries(entries: Vec<Archetype>) -> Result<Self> {
        let mut map = BTreeMap::new();

        for entry in entries {
            if entry.name.trim().is_empty() {
                return Err(InstrumentError::Configuration(format!(
                    "archetype {} has an empty name",
                    entry.pair
                )));
            }
            let pair = entry.pair;
            if map.insert(pair, entry).is_some() {
                return Err(InstrumentError::Configuration(format!(
                    "archetype pair {} defined more than once",
                    pair
                )));
            }
        }

        let missing: Vec<String> = ArchetypePair::all()
            .filter(|pair| !map.contains_key(pair))
            .map(|pair| pair.code())
            .collect();
        if !missing.is_empty() {
            return Err(InstrumentError::Configuration(format!(
                "archetype table is missing pairs: {}",
                missing.join(", ")
            )));
        }

        Ok(Self { entries: map })
    }

    /// Parse a `ray_pairs.json` style document.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<Archetype> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// The built-in table shipped with instrument v1.
    pub fn standard() -> Self {
        let entries = STANDARD_ARCHETYPES
            .iter()
            .map(|(code, name, essence)| Archetype {
                pair: code.parse().unwrap_or_else(|_| unreachable!("static pair code {}", code)),
                name: (*name).to_string(),
                essence: (*essence).to_string(),
            })
            .map(|a| (a.pair, a))
            .collect();
        Self { entries }
    }

    /// Look up the archetype for a canonical pair.
    pub fn get(&self, pair: &ArchetypePair) -> Option<&Archetype> {
        self.entries.get(pair)
    }

    /// All archetypes in canonical pair order.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const STANDARD_ARCHETYPES: [(&str, &str, &str); PAIR_COUNT] = [
    ("R1-R2", "Strategic Optimist", "Sets a clear course and keeps the energy to enjoy walking it."),
    ("R1-R3", "Mindful Architect", "Designs the day deliberately and stays fully in the room while building it."),
    ("R1-R4", "Decisive Director", "Turns clear intention into decisive, visible action."),
    ("R1-R5", "Mission Commander", "Points focused effort at what matters most and holds the line."),
    ("R1-R6", "True North Leader", "Chooses direction from values that are actually lived."),
    ("R1-R7", "Relational Strategist", "Plans with people in mind and brings them along on purpose."),
    ("R1-R8", "Visionary Planner", "Sees what could be and lays out the steps to get there."),
    ("R1-R9", "Servant Architect", "Builds structures that let other people shine."),
    ("R2-R3", "Present Celebrator", "Notices the good in the moment and lets it land."),
    ("R2-R4", "Confident Enthusiast", "Acts boldly and makes the work feel energizing."),
    ("R2-R5", "Joyful Missionary", "Finds delight in meaningful work and spreads it."),
    ("R2-R6", "Radiant Authentic", "Shows up as themselves with warmth that is easy to trust."),
    ("R2-R7", "Relational Spark", "Lifts the room and turns contact into connection."),
    ("R2-R8", "Optimistic Explorer", "Meets the unknown with curiosity instead of dread."),
    ("R2-R9", "Light Bringer", "Carries an energy that raises the standard for everyone nearby."),
    ("R3-R4", "Grounded Commander", "Acts with force that stays calm and regulated."),
    ("R3-R5", "Mindful Mission", "Holds purpose steadily, one present moment at a time."),
    ("R3-R6", "Present Truth", "Speaks honestly from a settled, grounded place."),
    ("R3-R7", "Deep Listener", "Gives full attention that makes people feel understood."),
    ("R3-R8", "Present Visionary", "Imagines boldly without leaving the here and now."),
    ("R3-R9", "Calm Center", "A steady presence others orient around when things get loud."),
    ("R4-R5", "Driven Leader", "Channels strength into outcomes that mean something."),
    ("R4-R6", "Bold Authentic", "Takes a stand without pretending to be someone else."),
    ("R4-R7", "Charismatic Connector", "Moves people by combining conviction with care."),
    ("R4-R8", "Risk-Taking Pioneer", "Goes first into new territory and makes it real."),
    ("R4-R9", "Empowering Force", "Uses influence to make other people stronger."),
    ("R5-R6", "True Missionary", "Lives a purpose that is unmistakably their own."),
    ("R5-R7", "Community Builder", "Gathers people around shared meaning and keeps them together."),
    ("R5-R8", "Visionary Missionary", "Connects purpose to possibilities others have not seen yet."),
    ("R5-R9", "Servant Leader", "Leads by serving a mission bigger than themselves."),
    ("R6-R7", "Trusted Confidant", "The person others bring the real story to."),
    ("R6-R8", "Authentic Innovator", "Creates new things that carry an honest signature."),
    ("R6-R9", "Truth Beacon", "Models honesty in a way that makes it safer for others."),
    ("R7-R8", "Network Cultivator", "Connects people and ideas into something larger."),
    ("R7-R9", "Relational Light", "Strengthens every relationship they touch."),
    ("R8-R9", "Visionary Servant", "Opens new possibilities and hands them to others."),
];
