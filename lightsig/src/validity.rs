//! Validity-check items and answer coverage.
//!
//! Check items sit outside the ray questions. Each kind is tallied on its
//! own and only turned into flags by [`crate::signals::assess_data_quality`].

use std::collections::{BTreeMap, HashMap};

use crate::config::DataQualityConfig;
use crate::intake::ResponseSet;
use instrument::{ItemPurpose, SubfacetId};

/// Counts behind the check-item flags of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckTally {
    /// Mean social-desirability reading (0-4), when any item was answered
    pub social_desirability: Option<f64>,
    /// Fully answered consistency pairs
    pub answered_pairs: usize,
    /// Pairs whose readings differ by at least the configured gap
    pub inconsistent_pairs: usize,
    pub attention_misses: usize,
    pub infrequency_hits: usize,
    /// Subfacets with fewer answered questions than the coverage share
    pub low_coverage_subfacets: usize,
}

impl CheckTally {
    pub fn sd_elevated(&self, config: &DataQualityConfig) -> bool {
        self.social_desirability
            .is_some_and(|sd| sd >= config.sd_elevated)
    }

    pub fn sd_extreme(&self, config: &DataQualityConfig) -> bool {
        self.social_desirability
            .is_some_and(|sd| sd >= config.sd_extreme)
    }

    pub fn inconsistent(&self, config: &DataQualityConfig) -> bool {
        self.inconsistent_pairs >= config.inconsistency_flag_pairs
    }

    pub fn inattentive(&self, config: &DataQualityConfig) -> bool {
        self.attention_misses >= config.attention_flag_misses
    }

    pub fn infrequent(&self, config: &DataQualityConfig) -> bool {
        self.infrequency_hits >= config.infrequency_flag_hits
    }

    pub fn thin_coverage(&self, config: &DataQualityConfig) -> bool {
        self.low_coverage_subfacets >= config.missingness_subfacets
    }
}

/// Tally the check items and question coverage of a run.
pub fn tally_checks(set: &ResponseSet<'_>, config: &DataQualityConfig) -> CheckTally {
    let mut tally = CheckTally::default();
    let mut desirability = Vec::new();
    let mut pairs: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for (item, value) in set.supplementary_answers() {
        let reading = item.reading(value) * 4.0;
        match &item.purpose {
            ItemPurpose::SocialDesirability => desirability.push(reading),
            ItemPurpose::Consistency { pair } => pairs.entry(pair.as_str()).or_default().push(reading),
            ItemPurpose::Attention { expected } => {
                if value != *expected {
                    tally.attention_misses += 1;
                }
            }
            ItemPurpose::Infrequency => {
                if reading >= config.infrequency_endorse {
                    tally.infrequency_hits += 1;
                }
            }
            ItemPurpose::Tool { .. } => {}
        }
    }

    if !desirability.is_empty() {
        tally.social_desirability =
            Some(desirability.iter().sum::<f64>() / desirability.len() as f64);
    }

    for readings in pairs.values() {
        if let [a, b] = readings.as_slice() {
            tally.answered_pairs += 1;
            if (a - b).abs() >= config.inconsistency_pair_diff {
                tally.inconsistent_pairs += 1;
            }
        }
    }

    let mut coverage: HashMap<SubfacetId, (usize, usize)> = HashMap::new();
    for question in &set.manifest().questions {
        let entry = coverage.entry(question.subfacet_id).or_default();
        entry.1 += 1;
        if set.value(&question.id).is_some() {
            entry.0 += 1;
        }
    }
    tally.low_coverage_subfacets = coverage
        .values()
        .filter(|(answered, total)| (*answered as f64) < config.subfacet_coverage * *total as f64)
        .count();

    tally
}
