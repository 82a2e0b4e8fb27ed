//! Country-year panel construction
//!
//! Stages run in a fixed order: disaster aggregation, entity scoring, the
//! speech/disaster merge, lag construction over the unfiltered merged panel,
//! and finally the collapse to country-year rows. Lags come before
//! filtering on purpose: a NonClimate-only year still supplies history to
//! later years.

pub mod aggregate;
pub mod disasters;
pub mod lags;
pub mod merge;
pub mod security;

pub use aggregate::{aggregate_panel, CountryYearRow, SpeechFilter};
pub use disasters::{aggregate_disasters, DisasterYearSummary};
pub use lags::{build_lags, LagTable, MAX_LAG};
pub use merge::{merge_panel, MergeStats, SpeechPanelRow};
pub use security::entity_propensity;

use crate::data::types::{ControlRecord, DisasterEvent, SpeechRecord};

/// Run the full construction pipeline over already-loaded inputs.
pub fn build_panel(
    speeches: &[SpeechRecord],
    disasters: &[DisasterEvent],
    controls: &[ControlRecord],
    filter: SpeechFilter,
) -> (Vec<CountryYearRow>, MergeStats) {
    let summaries = aggregate_disasters(disasters);
    let propensity = entity_propensity(speeches);
    let (rows, stats) = merge_panel(speeches, &summaries, controls, &propensity);
    let lag_table = build_lags(&rows);
    let panel = aggregate_panel(&rows, &lag_table, filter);
    (panel, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::TopicFlag;

    fn speech(doc_id: &str, entity: &str, year: i32, flag: TopicFlag) -> SpeechRecord {
        SpeechRecord {
            doc_id: doc_id.to_string(),
            entity_code: entity.to_string(),
            year,
            topic_flag: flag,
        }
    }

    fn disaster(entity: &str, year: i32, n: usize) -> Vec<DisasterEvent> {
        (0..n)
            .map(|_| DisasterEvent {
                entity_code: entity.to_string(),
                start_year: year,
                end_year: year,
                event_type: None,
                subtype: None,
                group: None,
                deaths: None,
                affected: None,
                damage_adjusted: None,
            })
            .collect()
    }

    #[test]
    fn test_lags_built_before_climate_filter() {
        // 2000 has only NonClimate speech; under ClimateOnly that cell
        // vanishes from the panel but still feeds the 2001 lag.
        let speeches = vec![
            speech("AFG_2000_1", "AFG", 2000, TopicFlag::NonClimate),
            speech("AFG_2001_1", "AFG", 2001, TopicFlag::SecuritizedClimate),
        ];
        let mut disasters = disaster("AFG", 2000, 2);
        disasters.extend(disaster("AFG", 2001, 1));

        let (panel, stats) =
            build_panel(&speeches, &disasters, &[], SpeechFilter::ClimateOnly);

        assert_eq!(stats.gap_rows, 0);
        assert_eq!(panel.len(), 1);
        assert_eq!(panel[0].year, 2001);
        assert_eq!(panel[0].disaster_at_lag(0), Some(1.0));
        assert_eq!(panel[0].disaster_at_lag(1), Some(2.0));
    }
}
