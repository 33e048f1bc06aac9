//! Practice tool catalog.
//!
//! Twelve tools, `T001` through `T012`. Each ray is trained by two of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{InstrumentError, RayId, Result};

/// A practice tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tool {
    WatchMe,
    IRise,
    GoFirst,
    Reps,
    Challenge143,
    NinetySecondWindow,
    RasReset,
    PresencePause,
    BoundaryOfLight,
    IfThenPlanning,
    QuestionLoop,
    Witness,
}

impl Tool {
    pub const ALL: [Tool; 12] = [
        Self::WatchMe,
        Self::IRise,
        Self::GoFirst,
        Self::Reps,
        Self::Challenge143,
        Self::NinetySecondWindow,
        Self::RasReset,
        Self::PresencePause,
        Self::BoundaryOfLight,
        Self::IfThenPlanning,
        Self::QuestionLoop,
        Self::Witness,
    ];

    /// Catalog id, `T001` through `T012`.
    pub fn id(&self) -> String {
        format!("T{:03}", *self as usize + 1)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::WatchMe => "Watch Me",
            Self::IRise => "I Rise",
            Self::GoFirst => "Go First",
            Self::Reps => "REPs",
            Self::Challenge143 => "143 Challenge",
            Self::NinetySecondWindow => "90-Second Window",
            Self::RasReset => "RAS Reset",
            Self::PresencePause => "Presence Pause",
            Self::BoundaryOfLight => "Boundary of Light",
            Self::IfThenPlanning => "If/Then Planning",
            Self::QuestionLoop => "Question Loop",
            Self::Witness => "Witness",
        }
    }

    /// The two tools that train a ray, primary first.
    pub fn for_ray(ray: RayId) -> [Tool; 2] {
        match ray {
            RayId::R1 => [Self::IfThenPlanning, Self::WatchMe],
            RayId::R2 => [Self::Reps, Self::RasReset],
            RayId::R3 => [Self::PresencePause, Self::NinetySecondWindow],
            RayId::R4 => [Self::BoundaryOfLight, Self::IRise],
            RayId::R5 => [Self::IfThenPlanning, Self::Challenge143],
            RayId::R6 => [Self::GoFirst, Self::IRise],
            RayId::R7 => [Self::GoFirst, Self::QuestionLoop],
            RayId::R8 => [Self::Challenge143, Self::WatchMe],
            RayId::R9 => [Self::Reps, Self::Witness],
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl FromStr for Tool {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self> {
        s.strip_prefix('T')
            .filter(|n| n.len() == 3)
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| InstrumentError::Parse(format!("unknown tool id: {}", s)))
    }
}

impl TryFrom<String> for Tool {
    type Error = InstrumentError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Tool> for String {
    fn from(value: Tool) -> Self {
        value.id()
    }
}
