//! Disaster event aggregation to entity-year summaries
//!
//! Every event is attributed to the entity-year in which it starts. Impact
//! totals are spread evenly over the event's duration before summing, so a
//! three-year drought with 300 deaths adds 100 to its start year. Missing
//! impact values add nothing, but the event still counts.

use crate::data::types::{DisasterEvent, DisasterGroup};
use std::collections::BTreeMap;

/// Aggregated disaster exposure for one (entity, year) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DisasterYearSummary {
    pub entity_code: String,
    pub year: i32,
    /// Number of events starting this year, regardless of category.
    pub disaster_count: usize,
    pub natural_count: usize,
    pub technological_count: usize,
    /// Duration-normalized sums; events with a missing value contribute 0.
    pub deaths: f64,
    pub affected: f64,
    pub damage_adjusted: f64,
    /// Distinct event types in first-appearance order.
    pub types: Vec<String>,
    pub subtypes: Vec<String>,
}

impl DisasterYearSummary {
    fn new(entity_code: String, year: i32) -> Self {
        DisasterYearSummary {
            entity_code,
            year,
            disaster_count: 0,
            natural_count: 0,
            technological_count: 0,
            deaths: 0.0,
            affected: 0.0,
            damage_adjusted: 0.0,
            types: Vec::new(),
            subtypes: Vec::new(),
        }
    }

    pub fn type_label(&self) -> String {
        self.types.join(", ")
    }

    pub fn subtype_label(&self) -> String {
        self.subtypes.join(", ")
    }
}

/// Collapse raw events into one summary per (entity, start year), sorted by
/// entity and year. Grouping makes the (entity, year) key unique by
/// construction.
pub fn aggregate_disasters(events: &[DisasterEvent]) -> Vec<DisasterYearSummary> {
    let mut groups: BTreeMap<(String, i32), DisasterYearSummary> = BTreeMap::new();

    for event in events {
        let summary = groups
            .entry((event.entity_code.clone(), event.start_year))
            .or_insert_with(|| {
                DisasterYearSummary::new(event.entity_code.clone(), event.start_year)
            });

        summary.disaster_count += 1;
        match event.group {
            Some(DisasterGroup::Natural) => summary.natural_count += 1,
            Some(DisasterGroup::Technological) => summary.technological_count += 1,
            None => {}
        }

        let duration = f64::from(event.duration());
        add_share(&mut summary.deaths, event.deaths, duration);
        add_share(&mut summary.affected, event.affected, duration);
        add_share(&mut summary.damage_adjusted, event.damage_adjusted, duration);

        push_distinct(&mut summary.types, event.event_type.as_deref());
        push_distinct(&mut summary.subtypes, event.subtype.as_deref());
    }

    groups.into_values().collect()
}

fn add_share(total: &mut f64, value: Option<f64>, duration: f64) {
    if let Some(value) = value {
        *total += value / duration;
    }
}

fn push_distinct(seen: &mut Vec<String>, value: Option<&str>) {
    if let Some(value) = value {
        if !value.is_empty() && !seen.iter().any(|s| s == value) {
            seen.push(value.to_string());
        }
    }
}
