//! Backward lag construction for disaster counts
//!
//! Lags are computed once per (entity, year) cell of the merged panel, as a
//! pure function of the panel itself. No future year is ever consulted and
//! no lookup crosses an entity boundary.

use crate::panel::merge::SpeechPanelRow;
use std::collections::{BTreeMap, HashMap};

/// Deepest lag carried through the pipeline.
pub const MAX_LAG: usize = 5;

/// Lags keyed by (entity, year); index `k - 1` holds the k-year lag.
pub type LagTable = HashMap<(String, i32), [Option<f64>; MAX_LAG]>;

/// Build lag_1..lag_5 of the disaster count for every cell of the merged
/// panel.
///
/// Lookups go against the panel's own year set: a year the panel does not
/// observe yields a missing lag even if the disaster table knows it, and a
/// present cell whose count is missing propagates missing rather than 0.
/// The first k observed years of an entity therefore have lag_k missing.
pub fn build_lags(rows: &[SpeechPanelRow]) -> LagTable {
    let mut series: BTreeMap<&str, BTreeMap<i32, Option<f64>>> = BTreeMap::new();
    for row in rows {
        series.entry(row.entity_code.as_str()).or_default().insert(
            row.year,
            row.disasters.as_ref().map(|s| s.disaster_count as f64),
        );
    }

    let mut table = LagTable::new();
    for (entity, counts) in &series {
        for &year in counts.keys() {
            let mut lags = [None; MAX_LAG];
            for k in 1..=MAX_LAG {
                lags[k - 1] = counts.get(&(year - k as i32)).copied().flatten();
            }
            table.insert((entity.to_string(), year), lags);
        }
    }
    table
}
