//! Core record types shared across the pipeline
//!
//! Three read-only inputs drive everything: classified speech records,
//! disaster event records, and per-document control covariates. All derived
//! tables are recomputed from these on every run.

use serde::{Deserialize, Serialize};

/// Topic classification of a single speech document.
///
/// The three-valued flag is validated at ingestion; any other string in the
/// source table is a schema error, never silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicFlag {
    /// Climate discussed without security framing.
    #[serde(alias = "ClimateOnly")]
    ClimateOnly,
    /// Climate framed as a security concern.
    #[serde(alias = "SecuritizedClimate")]
    SecuritizedClimate,
    /// Speech does not address climate at all.
    #[serde(alias = "NonClimate")]
    NonClimate,
}

impl TopicFlag {
    /// Binary securitization outcome: 1 iff the speech frames climate as a
    /// security issue. NonClimate speeches carry 0 and contribute nothing to
    /// security counts.
    pub fn security_bit(&self) -> u8 {
        match self {
            TopicFlag::SecuritizedClimate => 1,
            TopicFlag::ClimateOnly | TopicFlag::NonClimate => 0,
        }
    }

    /// Whether the speech addresses climate in any framing. Only these
    /// records enter the historical propensity denominator.
    pub fn is_climate(&self) -> bool {
        matches!(self, TopicFlag::ClimateOnly | TopicFlag::SecuritizedClimate)
    }
}

/// One classified speech document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRecord {
    pub doc_id: String,
    pub entity_code: String,
    pub year: i32,
    pub topic_flag: TopicFlag,
}

/// Broad disaster category from the event source.
///
/// Events with no category are counted in the overall disaster count but in
/// neither of the per-group counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisasterGroup {
    #[serde(alias = "Natural")]
    Natural,
    #[serde(alias = "Technological")]
    Technological,
}

/// One disaster event, possibly spanning several calendar years.
///
/// Impact fields are raw event totals; duration-normalization happens in the
/// aggregation step, never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterEvent {
    pub entity_code: String,
    pub start_year: i32,
    pub end_year: i32,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub subtype: Option<String>,
    pub group: Option<DisasterGroup>,
    pub deaths: Option<f64>,
    pub affected: Option<f64>,
    pub damage_adjusted: Option<f64>,
}

impl DisasterEvent {
    /// Number of calendar years the event spans, always >= 1 for a valid
    /// event. Ingestion rejects `end_year < start_year`, so division by this
    /// value is safe.
    pub fn duration(&self) -> i32 {
        self.end_year - self.start_year + 1
    }
}

/// Control covariates for one speech document, joined by `doc_id`.
///
/// Every covariate may be absent; nothing is ever imputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRecord {
    pub doc_id: String,
    pub gdp_per_capita: Option<f64>,
    pub log_population: Option<f64>,
    pub regime_type: Option<f64>,
    pub military_expenditure: Option<f64>,
    pub warming: Option<f64>,
    pub agreement_usa: Option<f64>,
    pub concern: Option<f64>,
}

/// The covariate slice of a [`ControlRecord`] as carried through the panel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Controls {
    pub gdp_per_capita: Option<f64>,
    pub log_population: Option<f64>,
    pub regime_type: Option<f64>,
    pub military_expenditure: Option<f64>,
    pub warming: Option<f64>,
    pub agreement_usa: Option<f64>,
    pub concern: Option<f64>,
}

impl Controls {
    /// Fill each covariate that is still missing from `other`, leaving
    /// already-present values untouched. Used for the first-non-null
    /// projection when collapsing speech rows to one row per entity-year.
    pub fn fill_missing_from(&mut self, other: &Controls) {
        if self.gdp_per_capita.is_none() {
            self.gdp_per_capita = other.gdp_per_capita;
        }
        if self.log_population.is_none() {
            self.log_population = other.log_population;
        }
        if self.regime_type.is_none() {
            self.regime_type = other.regime_type;
        }
        if self.military_expenditure.is_none() {
            self.military_expenditure = other.military_expenditure;
        }
        if self.warming.is_none() {
            self.warming = other.warming;
        }
        if self.agreement_usa.is_none() {
            self.agreement_usa = other.agreement_usa;
        }
        if self.concern.is_none() {
            self.concern = other.concern;
        }
    }
}

impl From<&ControlRecord> for Controls {
    fn from(rec: &ControlRecord) -> Self {
        Self {
            gdp_per_capita: rec.gdp_per_capita,
            log_population: rec.log_population,
            regime_type: rec.regime_type,
            military_expenditure: rec.military_expenditure,
            warming: rec.warming,
            agreement_usa: rec.agreement_usa,
            concern: rec.concern,
        }
    }
}
