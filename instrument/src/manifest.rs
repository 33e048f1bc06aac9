//! Question manifest loading and validation.
//!
//! A manifest is the ordered list of questions for one instrument version.
//! Order matters: data-quality checks walk answers in manifest order.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::tools::Tool;
use crate::types::{
    InstrumentError, ItemPurpose, LoadDimension, Polarity, PressureMode, Question, RayId, Result,
    Scale, SubfacetId, SupplementaryItem,
};

/// Version string of the built-in instrument.
pub const STANDARD_VERSION: &str = "v1";

/// Baseline items per subfacet in the standard instrument.
const BASELINE_PER_SUBFACET: usize = 3;

/// Load indicators of the standard instrument, tagged on the under-pressure
/// item of each listed subfacet.
const STANDARD_LOAD_INDICATORS: [(RayId, char, LoadDimension); 9] = [
    (RayId::R2, 'd', LoadDimension::Emotional),
    (RayId::R3, 'c', LoadDimension::Emotional),
    (RayId::R3, 'd', LoadDimension::Emotional),
    (RayId::R1, 'b', LoadDimension::Cognitive),
    (RayId::R3, 'a', LoadDimension::Cognitive),
    (RayId::R3, 'b', LoadDimension::Cognitive),
    (RayId::R4, 'c', LoadDimension::Relational),
    (RayId::R7, 'a', LoadDimension::Relational),
    (RayId::R7, 'c', LoadDimension::Relational),
];

const BASELINE_PROMPTS: [&str; BASELINE_PER_SUBFACET] = [
    "In a typical week, I practice {label} on purpose.",
    "People who work with me would say {label} is a reliable part of how I lead.",
    "When I reflect on recent weeks, {label} came naturally to me.",
];

const UNDER_PRESSURE_PROMPT: &str =
    "When stakes are high and time is short, I can still draw on {label}.";

/// Tool prompts as (framing, keying, template), three per bucket.
const TOOL_PROMPTS: [(PressureMode, Polarity, &str); 9] = [
    (PressureMode::Baseline, Polarity::Normal, "I use {tool} on purpose in a typical week."),
    (PressureMode::Baseline, Polarity::Normal, "{tool} is part of how I start or close my day."),
    (PressureMode::Baseline, Polarity::Normal, "I could teach {tool} to someone on my team."),
    (PressureMode::UnderPressure, Polarity::Normal, "When pressure spikes, I remember to use {tool}."),
    (PressureMode::UnderPressure, Polarity::Normal, "On my hardest days, {tool} still gets me back on track."),
    (PressureMode::UnderPressure, Polarity::Normal, "Under a deadline, I reach for {tool} before I react."),
    (PressureMode::UnderPressure, Polarity::Reverse, "Under pressure, I drop {tool} even when I know it helps."),
    (PressureMode::UnderPressure, Polarity::Reverse, "When I am stretched thin, {tool} turns into one more chore."),
    (PressureMode::UnderPressure, Polarity::Reverse, "Under strain, I use {tool} to look composed rather than to reset."),
];

const SOCIAL_DESIRABILITY_PROMPTS: [&str; 4] = [
    "I have never felt irritated with a colleague.",
    "I always keep every promise I make, no matter how small.",
    "I have never put off a task I did not enjoy.",
    "I am always patient, even when someone is slow to understand.",
];

const ATTENTION_PROMPTS: [(i32, &str); 3] = [
    (0, "To show you are reading carefully, select Never for this item."),
    (4, "To show you are reading carefully, select Almost always for this item."),
    (1, "To show you are reading carefully, select Rarely for this item."),
];

const INFREQUENCY_PROMPTS: [&str; 3] = [
    "I have led a meeting while fully asleep.",
    "I have never once used a phone or computer for work.",
    "I read every page of every document I receive, the same day.",
];

/// Pairs as (normal-keyed, reverse-keyed) restatements.
const CONSISTENCY_PROMPTS: [(&str, &str); 3] = [
    (
        "I set my top priorities before checking messages.",
        "Messages decide my priorities before I do.",
    ),
    (
        "I say no when a request conflicts with what matters most.",
        "I agree to requests even when they pull me off what matters most.",
    ),
    (
        "I stay with the person in front of me until the conversation ends.",
        "My mind drifts to other work while someone is talking to me.",
    ),
];

/// Ordered, validated list of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionManifest {
    /// Instrument version recorded in every output
    pub version: String,
    /// Questions in presentation order
    pub questions: Vec<Question>,
    /// Optional tool and validity-check items, presented after the questions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supplementary: Vec<SupplementaryItem>,
}

impl QuestionManifest {
    /// Parse and validate a JSON manifest.
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse and validate a YAML manifest.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(yaml)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// The built-in 143-question instrument.
    ///
    /// Every subfacet gets three baseline items and one under-pressure item,
    /// except `R9d` which carries two baseline items. Nine items per tool and
    /// sixteen validity checks follow as supplementary items.
    pub fn standard() -> Self {
        let mut questions = Vec::with_capacity(143);

        for subfacet in SubfacetId::all() {
            let label = subfacet.label();
            let baseline_count = if subfacet.ray == RayId::R9 && subfacet.letter == 'd' {
                BASELINE_PER_SUBFACET - 1
            } else {
                BASELINE_PER_SUBFACET
            };

            for template in BASELINE_PROMPTS.iter().take(baseline_count) {
                questions.push(standard_question(
                    questions.len() + 1,
                    subfacet,
                    template.replace("{label}", &label.to_lowercase()),
                    PressureMode::Baseline,
                    None,
                ));
            }

            let load_dimension = STANDARD_LOAD_INDICATORS
                .iter()
                .find(|(ray, letter, _)| *ray == subfacet.ray && *letter == subfacet.letter)
                .map(|(_, _, dimension)| *dimension);
            questions.push(standard_question(
                questions.len() + 1,
                subfacet,
                UNDER_PRESSURE_PROMPT.replace("{label}", &label.to_lowercase()),
                PressureMode::UnderPressure,
                load_dimension,
            ));
        }

        Self {
            version: STANDARD_VERSION.to_string(),
            questions,
            supplementary: standard_supplementary(),
        }
    }

    /// Check structural consistency.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(InstrumentError::Configuration(
                "manifest version is empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (id, scale) in self.items() {
            if !seen.insert(id) {
                return Err(InstrumentError::Configuration(format!(
                    "duplicate question id: {}",
                    id
                )));
            }
            if scale.width() <= 0 {
                return Err(InstrumentError::Configuration(format!(
                    "question {} has an empty scale {}..{}",
                    id, scale.min, scale.max
                )));
            }
        }

        for question in &self.questions {
            if question.subfacet_id.ray != question.ray_id {
                return Err(InstrumentError::Configuration(format!(
                    "question {} measures {} but subfacet {} belongs to {}",
                    question.id, question.ray_id, question.subfacet_id, question.subfacet_id.ray
                )));
            }
        }

        self.validate_supplementary()?;

        let covered: BTreeSet<SubfacetId> = self
            .questions
            .iter()
            .filter(|q| q.pressure_mode == PressureMode::Baseline)
            .map(|q| q.subfacet_id)
            .collect();
        let uncovered: Vec<String> = SubfacetId::all()
            .filter(|s| !covered.contains(s))
            .map(|s| s.to_string())
            .collect();
        if !uncovered.is_empty() {
            return Err(InstrumentError::Configuration(format!(
                "subfacets without a baseline question: {}",
                uncovered.join(", ")
            )));
        }

        for dimension in LoadDimension::ALL {
            if !self
                .questions
                .iter()
                .any(|q| q.load_dimension == Some(dimension))
            {
                return Err(InstrumentError::Configuration(format!(
                    "no question indicates {} load",
                    dimension.as_str()
                )));
            }
        }

        Ok(())
    }

    fn validate_supplementary(&self) -> Result<()> {
        let mut pairs: HashMap<&str, usize> = HashMap::new();
        for item in &self.supplementary {
            match &item.purpose {
                ItemPurpose::Attention { expected } if !item.scale.contains(*expected) => {
                    return Err(InstrumentError::Configuration(format!(
                        "attention item {} expects {} outside its scale {}..{}",
                        item.id, expected, item.scale.min, item.scale.max
                    )));
                }
                ItemPurpose::Consistency { pair } => {
                    *pairs.entry(pair.as_str()).or_default() += 1;
                }
                _ => {}
            }
        }

        let mut broken: Vec<&str> = pairs
            .into_iter()
            .filter(|(_, count)| *count != 2)
            .map(|(pair, _)| pair)
            .collect();
        if !broken.is_empty() {
            broken.sort_unstable();
            return Err(InstrumentError::Configuration(format!(
                "consistency pairs need exactly two items: {}",
                broken.join(", ")
            )));
        }
        Ok(())
    }

    /// Id and scale of every item, questions first.
    pub fn items(&self) -> impl Iterator<Item = (&str, Scale)> {
        self.questions
            .iter()
            .map(|q| (q.id.as_str(), q.scale))
            .chain(self.supplementary.iter().map(|s| (s.id.as_str(), s.scale)))
    }

    /// Questions plus supplementary items.
    pub fn item_count(&self) -> usize {
        self.questions.len() + self.supplementary.len()
    }

    /// Index of item positions by id.
    ///
    /// Positions below [`len`](Self::len) are questions; the rest are
    /// supplementary items in order.
    pub fn index(&self) -> HashMap<&str, usize> {
        self.items()
            .enumerate()
            .map(|(i, (id, _))| (id, i))
            .collect()
    }

    /// Find a question by id.
    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Number of ray questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions tagged with a load dimension.
    pub fn load_indicators(&self, dimension: LoadDimension) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(move |q| q.load_dimension == Some(dimension))
    }

    /// Find a supplementary item by id.
    pub fn get_supplementary(&self, id: &str) -> Option<&SupplementaryItem> {
        self.supplementary.iter().find(|s| s.id == id)
    }

    /// Supplementary items that measure a tool.
    pub fn tool_items(&self, tool: Tool) -> impl Iterator<Item = &SupplementaryItem> {
        self.supplementary
            .iter()
            .filter(move |s| s.tool() == Some(tool))
    }

    /// SHA-256 over every field of every item, hex encoded.
    ///
    /// Each field is length-prefixed, so distinct manifests never share an
    /// encoding.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let mut field = |bytes: &[u8]| {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        };

        field(self.version.as_bytes());
        for q in &self.questions {
            field(q.id.as_bytes());
            field(q.ray_id.as_str().as_bytes());
            field(q.subfacet_id.to_string().as_bytes());
            field(q.prompt.as_bytes());
            field(&q.scale.min.to_le_bytes());
            field(&q.scale.max.to_le_bytes());
            field(q.pressure_mode.as_str().as_bytes());
            field(q.polarity.as_str().as_bytes());
            field(q.load_dimension.map_or("", |d| d.as_str()).as_bytes());
            field(&[u8::from(q.required)]);
        }
        for item in &self.supplementary {
            field(item.id.as_bytes());
            field(item.prompt.as_bytes());
            field(&item.scale.min.to_le_bytes());
            field(&item.scale.max.to_le_bytes());
            field(item.pressure_mode.as_str().as_bytes());
            field(item.polarity.as_str().as_bytes());
            field(item.purpose.kind().as_bytes());
            match &item.purpose {
                ItemPurpose::Tool { tool } => field(tool.id().as_bytes()),
                ItemPurpose::Attention { expected } => field(&expected.to_le_bytes()),
                ItemPurpose::Consistency { pair } => field(pair.as_bytes()),
                ItemPurpose::SocialDesirability | ItemPurpose::Infrequency => {}
            }
        }
        hex::encode(hasher.finalize())
    }
}

fn supplementary_item(
    id: String,
    prompt: &str,
    pressure_mode: PressureMode,
    polarity: Polarity,
    purpose: ItemPurpose,
) -> SupplementaryItem {
    SupplementaryItem {
        id,
        prompt: prompt.to_string(),
        scale: Scale::LIKERT,
        pressure_mode,
        polarity,
        purpose,
    }
}

fn standard_supplementary() -> Vec<SupplementaryItem> {
    let mut items = Vec::new();

    for tool in Tool::ALL {
        for (n, (pressure_mode, polarity, template)) in TOOL_PROMPTS.iter().enumerate() {
            items.push(supplementary_item(
                format!("{}-{}", tool.id(), n + 1),
                &template.replace("{tool}", tool.name()),
                *pressure_mode,
                *polarity,
                ItemPurpose::Tool { tool },
            ));
        }
    }

    for (n, prompt) in SOCIAL_DESIRABILITY_PROMPTS.iter().enumerate() {
        items.push(supplementary_item(
            format!("VSD{}", n + 1),
            prompt,
            PressureMode::Baseline,
            Polarity::Normal,
            ItemPurpose::SocialDesirability,
        ));
    }
    for (n, (expected, prompt)) in ATTENTION_PROMPTS.iter().enumerate() {
        items.push(supplementary_item(
            format!("VATT{}", n + 1),
            prompt,
            PressureMode::Baseline,
            Polarity::Normal,
            ItemPurpose::Attention {
                expected: *expected,
            },
        ));
    }
    for (n, prompt) in INFREQUENCY_PROMPTS.iter().enumerate() {
        items.push(supplementary_item(
            format!("VINF{}", n + 1),
            prompt,
            PressureMode::Baseline,
            Polarity::Normal,
            ItemPurpose::Infrequency,
        ));
    }
    for (n, (forward, reverse)) in CONSISTENCY_PROMPTS.iter().enumerate() {
        let pair = format!("P{}", n + 1);
        for (suffix, prompt, polarity) in [
            ('A', forward, Polarity::Normal),
            ('B', reverse, Polarity::Reverse),
        ] {
            items.push(supplementary_item(
                format!("VCON{}{}", n + 1, suffix),
                prompt,
                PressureMode::Baseline,
                polarity,
                ItemPurpose::Consistency { pair: pair.clone() },
            ));
        }
    }

    items
}

fn standard_question(
    number: usize,
    subfacet: SubfacetId,
    prompt: String,
    pressure_mode: PressureMode,
    load_dimension: Option<LoadDimension>,
) -> Question {
    Question {
        id: format!("Q{:03}", number),
        ray_id: subfacet.ray,
        subfacet_id: subfacet,
        prompt,
        scale: Scale::LIKERT,
        pressure_mode,
        polarity: Polarity::Normal,
        load_dimension,
        required: true,
    }
}
