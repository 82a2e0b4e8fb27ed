//! Speech/disaster left join
//!
//! Every speech row survives the merge. Cells without a disaster summary
//! keep their disaster fields missing rather than zero; only later
//! aggregation decides where missing may collapse to 0.

use crate::data::types::{ControlRecord, Controls, SpeechRecord, TopicFlag};
use crate::panel::disasters::DisasterYearSummary;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

/// One speech document with everything joined onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechPanelRow {
    pub doc_id: String,
    pub entity_code: String,
    pub year: i32,
    pub topic_flag: TopicFlag,
    pub security_bit: u8,
    /// Entity-level diagnostic score; absent for entities with no climate
    /// speech at all.
    pub propensity: Option<f64>,
    /// Disaster summary for this (entity, year), when one exists.
    pub disasters: Option<DisasterYearSummary>,
    pub controls: Option<Controls>,
}

/// Join bookkeeping, reported once per merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub rows: usize,
    pub matched_rows: usize,
    /// Speech rows whose (entity, year) has no disaster summary.
    pub gap_rows: usize,
    /// Distinct (entity, year) cells among those rows.
    pub gap_cells: usize,
}

/// Left-join speeches with disaster summaries on (entity, year) and controls
/// on doc_id. Gap totals are logged once; individual gaps are expected and
/// never abort the run.
pub fn merge_panel(
    speeches: &[SpeechRecord],
    summaries: &[DisasterYearSummary],
    controls: &[ControlRecord],
    propensity: &BTreeMap<String, f64>,
) -> (Vec<SpeechPanelRow>, MergeStats) {
    let by_cell: HashMap<(&str, i32), &DisasterYearSummary> = summaries
        .iter()
        .map(|s| ((s.entity_code.as_str(), s.year), s))
        .collect();

    let mut by_doc: HashMap<&str, Controls> = HashMap::new();
    for record in controls {
        by_doc
            .entry(record.doc_id.as_str())
            .and_modify(|existing| existing.fill_missing_from(&Controls::from(record)))
            .or_insert_with(|| Controls::from(record));
    }

    let mut rows = Vec::with_capacity(speeches.len());
    let mut gap_rows = 0;
    let mut gap_cells: HashSet<(&str, i32)> = HashSet::new();

    for speech in speeches {
        let cell = (speech.entity_code.as_str(), speech.year);
        let disasters = by_cell.get(&cell).map(|s| (*s).clone());
        if disasters.is_none() {
            gap_rows += 1;
            gap_cells.insert(cell);
        }
        rows.push(SpeechPanelRow {
            doc_id: speech.doc_id.clone(),
            entity_code: speech.entity_code.clone(),
            year: speech.year,
            topic_flag: speech.topic_flag,
            security_bit: speech.topic_flag.security_bit(),
            propensity: propensity.get(&speech.entity_code).copied(),
            disasters,
            controls: by_doc.get(speech.doc_id.as_str()).cloned(),
        });
    }

    let stats = MergeStats {
        rows: rows.len(),
        matched_rows: rows.len() - gap_rows,
        gap_rows,
        gap_cells: gap_cells.len(),
    };
    if stats.gap_rows > 0 {
        warn!(
            gap_rows = stats.gap_rows,
            gap_cells = stats.gap_cells,
            total_rows = stats.rows,
            "speech rows without a disaster summary keep missing disaster fields"
        );
    }

    (rows, stats)
}
