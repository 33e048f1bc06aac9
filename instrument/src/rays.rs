//! Fixed ray and subfacet definitions.
//!
//! Every ray carries display copy used by the report: its name, a short
//! chart label, the verb that anchors its practice, and the distortion it
//! tends toward under pressure.

use serde::Serialize;

use crate::types::{RayId, SubfacetId};

/// Static description of a ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RayDefinition {
    pub id: RayId,
    /// Full display name
    pub name: &'static str,
    /// Short label for tight chart layouts
    pub short_name: &'static str,
    /// Practice verb
    pub verb: &'static str,
    /// How this ray tends to distort under load
    pub under_load_distortion: &'static str,
}

impl RayId {
    /// Fixed definition of this ray.
    pub fn definition(&self) -> RayDefinition {
        let (name, short_name, verb, under_load_distortion) = match self {
            Self::R1 => (
                "Ray of Intention",
                "Intention",
                "Choose",
                "Under pressure, scattered priorities and reactive drift may replace clear direction.",
            ),
            Self::R2 => (
                "Ray of Joy",
                "Joy",
                "Expand",
                "Under pressure, joy access may narrow and numbness or forced positivity may surface.",
            ),
            Self::R3 => (
                "Ray of Presence",
                "Presence",
                "Anchor",
                "Under pressure, attention may fracture and reactivity may overtake grounding.",
            ),
            Self::R4 => (
                "Ray of Power",
                "Power",
                "Act",
                "Under pressure, aggression or withdrawal may replace measured power.",
            ),
            Self::R5 => (
                "Ray of Purpose",
                "Purpose",
                "Align",
                "Under pressure, cynicism or meaning-loss may surface and effort feels untethered.",
            ),
            Self::R6 => (
                "Ray of Authenticity",
                "Authenticity",
                "Reveal",
                "Under pressure, masking or performative behavior may replace authenticity.",
            ),
            Self::R7 => (
                "Ray of Connection",
                "Connection",
                "Attune",
                "Under pressure, withdrawal or people-pleasing may replace genuine connection.",
            ),
            Self::R8 => (
                "Ray of Possibility",
                "Possibility",
                "Explore",
                "Under pressure, rigidity or overwhelm may replace open exploration.",
            ),
            Self::R9 => (
                "Be The Light",
                "Be The Light",
                "Inspire",
                "Under pressure, overextension or withdrawal from influence may surface.",
            ),
        };

        RayDefinition {
            id: *self,
            name,
            short_name,
            verb,
            under_load_distortion,
        }
    }

    /// Full display name.
    pub fn name(&self) -> &'static str {
        self.definition().name
    }
}

impl SubfacetId {
    /// Display label of this subfacet.
    pub fn label(&self) -> &'static str {
        use RayId::*;
        match (self.ray, self.letter) {
            (R1, 'a') => "Daily Intentionality",
            (R1, 'b') => "Time/Attention Architecture",
            (R1, 'c') => "Boundary Clarity",
            (R1, _) => "Pre-Decision Practice",
            (R2, 'a') => "Joy Access",
            (R2, 'b') => "Gratitude Practice",
            (R2, 'c') => "Reinforcement Behavior",
            (R2, _) => "Recovery Integration",
            (R3, 'a') => "Attention Stability",
            (R3, 'b') => "Cognitive Flexibility",
            (R3, 'c') => "Body Signal Awareness",
            (R3, _) => "Emotional Regulation",
            (R4, 'a') => "Agency/Action Orientation",
            (R4, 'b') => "Boundary Enforcement",
            (R4, 'c') => "Conflict Engagement",
            (R4, _) => "Power Under Pressure",
            (R5, 'a') => "Purpose Clarity",
            (R5, 'b') => "Values Alignment",
            (R5, 'c') => "Meaningful Contribution",
            (R5, _) => "Long-Range Thinking",
            (R6, 'a') => "Self-Disclosure",
            (R6, 'b') => "Congruence",
            (R6, 'c') => "Vulnerability Tolerance",
            (R6, _) => "Identity Integration",
            (R7, 'a') => "Relational Safety Creation",
            (R7, 'b') => "Empathic Accuracy",
            (R7, 'c') => "Repair Initiation",
            (R7, _) => "Trust Building",
            (R8, 'a') => "Cognitive Openness",
            (R8, 'b') => "Divergent Thinking",
            (R8, 'c') => "Adaptive Flexibility",
            (R8, _) => "Creative Problem-Solving",
            (R9, 'a') => "Behavioral Modeling",
            (R9, 'b') => "Standard Setting",
            (R9, 'c') => "Generative Impact",
            (R9, _) => "Legacy Orientation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_definitions_are_distinct() {
        let names: HashSet<_> = RayId::ALL.iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), 9);
        assert_eq!(RayId::R7.definition().verb, "Attune");
        assert_eq!(RayId::R9.name(), "Be The Light");
    }

    #[test]
    fn test_subfacet_labels_are_distinct() {
        let labels: HashSet<_> = SubfacetId::all().map(|s| s.label()).collect();
        assert_eq!(labels.len(), 36);
    }
}
