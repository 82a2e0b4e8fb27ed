//! Event-level panel to country-year panel
//!
//! Speech rows collapse to one row per (entity, year). Security bits sum;
//! disaster figures and the propensity score are projections (every speech
//! row of a cell carries the same values, so the first non-missing one
//! wins); control covariates project per covariate.

use crate::data::types::{Controls, TopicFlag};
use crate::panel::lags::{LagTable, MAX_LAG};
use crate::panel::merge::SpeechPanelRow;
use std::collections::BTreeMap;

/// Which speech rows enter the aggregated panel.
///
/// Under `All`, NonClimate rows stay in the cell and contribute 0 to
/// `sum_security`; under `ClimateOnly` they are dropped before grouping, so
/// a cell with nothing but NonClimate speech disappears entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeechFilter {
    #[default]
    All,
    ClimateOnly,
}

impl SpeechFilter {
    fn keeps(self, flag: TopicFlag) -> bool {
        match self {
            SpeechFilter::All => true,
            SpeechFilter::ClimateOnly => flag.is_climate(),
        }
    }
}

/// One aggregated (entity, year) observation.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryYearRow {
    pub entity_code: String,
    pub year: i32,
    pub decade: i32,
    /// Speech rows retained in this cell after filtering.
    pub n_speeches: usize,
    pub sum_security: f64,
    pub propensity: Option<f64>,
    pub disaster_count: Option<f64>,
    /// Index `k - 1` holds the k-year lag of `disaster_count`.
    pub lags: [Option<f64>; MAX_LAG],
    pub deaths: Option<f64>,
    pub affected: Option<f64>,
    pub damage_adjusted: Option<f64>,
    pub natural_count: Option<f64>,
    pub technological_count: Option<f64>,
    pub controls: Controls,
}

impl CountryYearRow {
    /// Disaster count lagged by `k` years; `k = 0` is the contemporaneous
    /// count, anything past the table depth is missing.
    pub fn disaster_at_lag(&self, k: usize) -> Option<f64> {
        if k == 0 {
            self.disaster_count
        } else {
            self.lags.get(k - 1).copied().flatten()
        }
    }
}

/// Collapse the merged panel to one row per (entity, year), sorted by entity
/// and year. Grouping the already-aggregated cell set again would change
/// nothing; every reduction here is either a sum over rows or a projection.
pub fn aggregate_panel(
    rows: &[SpeechPanelRow],
    lags: &LagTable,
    filter: SpeechFilter,
) -> Vec<CountryYearRow> {
    let mut groups: BTreeMap<(String, i32), CountryYearRow> = BTreeMap::new();

    for row in rows {
        if !filter.keeps(row.topic_flag) {
            continue;
        }
        let key = (row.entity_code.clone(), row.year);
        let lag_row = lags.get(&key).copied().unwrap_or([None; MAX_LAG]);
        let cell = groups.entry(key).or_insert_with(|| CountryYearRow {
            entity_code: row.entity_code.clone(),
            year: row.year,
            decade: (row.year / 10) * 10,
            n_speeches: 0,
            sum_security: 0.0,
            propensity: None,
            disaster_count: None,
            lags: lag_row,
            deaths: None,
            affected: None,
            damage_adjusted: None,
            natural_count: None,
            technological_count: None,
            controls: Controls::default(),
        });

        cell.n_speeches += 1;
        cell.sum_security += f64::from(row.security_bit);
        if cell.propensity.is_none() {
            cell.propensity = row.propensity;
        }
        if cell.disaster_count.is_none() {
            if let Some(summary) = &row.disasters {
                cell.disaster_count = Some(summary.disaster_count as f64);
                cell.deaths = Some(summary.deaths);
                cell.affected = Some(summary.affected);
                cell.damage_adjusted = Some(summary.damage_adjusted);
                cell.natural_count = Some(summary.natural_count as f64);
                cell.technological_count = Some(summary.technological_count as f64);
            }
        }
        if let Some(controls) = &row.controls {
            cell.controls.fill_missing_from(controls);
        }
    }

    groups.into_values().collect()
}
