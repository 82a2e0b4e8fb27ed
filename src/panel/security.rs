//! Entity-level securitization propensity
//!
//! The binary outcome flag itself lives on [`TopicFlag::security_bit`];
//! this module adds the historical per-entity score derived from it.

use crate::data::types::SpeechRecord;
use std::collections::BTreeMap;

/// Share of securitized speech among an entity's climate-topic records.
///
/// Only ClimateOnly and SecuritizedClimate records qualify for the average,
/// but the score describes the entity as a whole and gets attached to every
/// one of its rows, NonClimate included. It is a descriptive attribute for
/// downstream analysis, never a model input. Entities without a single
/// qualifying record have no score.
pub fn entity_propensity(speeches: &[SpeechRecord]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for speech in speeches {
        if speech.topic_flag.is_climate() {
            let entry = sums.entry(speech.entity_code.clone()).or_insert((0.0, 0));
            entry.0 += f64::from(speech.topic_flag.security_bit());
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(entity, (sum, count))| (entity, sum / count as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::TopicFlag;

    fn speech(entity: &str, flag: TopicFlag) -> SpeechRecord {
        SpeechRecord {
            doc_id: format!("{entity}_x"),
            entity_code: entity.to_string(),
            year: 2000,
            topic_flag: flag,
        }
    }

    #[test]
    fn test_propensity_over_climate_records_only() {
        let speeches = vec![
            speech("AFG", TopicFlag::SecuritizedClimate),
            speech("AFG", TopicFlag::SecuritizedClimate),
            speech("AFG", TopicFlag::ClimateOnly),
            speech("AFG", TopicFlag::NonClimate),
            speech("AFG", TopicFlag::NonClimate),
        ];

        let propensity = entity_propensity(&speeches);
        // 2 securitized out of 3 climate records; NonClimate rows do not dilute.
        assert!((propensity["AFG"] - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_entity_without_climate_speech_has_no_score() {
        let speeches = vec![
            speech("AFG", TopicFlag::ClimateOnly),
            speech("BRA", TopicFlag::NonClimate),
        ];

        let propensity = entity_propensity(&speeches);
        assert!((propensity["AFG"] - 0.0).abs() < 1e-9);
        assert!(!propensity.contains_key("BRA"));
    }
}
