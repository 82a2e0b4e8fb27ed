//! Explicit regression specifications
//!
//! One value per lag instead of assembling formula strings: the outcome,
//! the ordered predictor names, the fixed-effect switches, and the
//! confidence level are all plain data, so every specification can be
//! inspected and tested on its own.

use crate::panel::MAX_LAG;

/// Outcome column for every specification in the sweep.
pub const OUTCOME_TERM: &str = "sum_security";

/// Control covariates, in the order they enter the design matrix.
pub const CONTROL_TERMS: &[&str] = &[
    "gdp_per_capita",
    "log_population",
    "regime_type",
    "military_expenditure",
    "warming",
    "agreement_usa",
    "concern",
];

/// A single fittable model: outcome, ordered predictors, fixed-effect
/// switches, confidence level.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionSpec {
    /// Lag index this specification belongs to, 0..=5.
    pub lag: usize,
    pub outcome: String,
    /// Named predictors in design-matrix order, disaster term first.
    pub predictors: Vec<String>,
    pub entity_fe: bool,
    pub decade_fe: bool,
    /// Two-sided confidence level for intervals, strictly between 0 and 1.
    pub confidence: f64,
}

impl RegressionSpec {
    /// Specification for one lag of the sweep.
    pub fn for_lag(
        lag: usize,
        with_controls: bool,
        entity_fe: bool,
        decade_fe: bool,
        confidence: f64,
    ) -> Self {
        let mut predictors = vec![disaster_term(lag)];
        if with_controls {
            predictors.extend(CONTROL_TERMS.iter().map(|t| t.to_string()));
        }
        RegressionSpec {
            lag,
            outcome: OUTCOME_TERM.to_string(),
            predictors,
            entity_fe,
            decade_fe,
            confidence,
        }
    }

    /// Name of this specification's disaster predictor.
    pub fn disaster_term(&self) -> String {
        disaster_term(self.lag)
    }
}

/// `disaster_count` at lag 0, `disaster_count_lag_k` beyond.
pub fn disaster_term(lag: usize) -> String {
    if lag == 0 {
        "disaster_count".to_string()
    } else {
        format!("disaster_count_lag_{lag}")
    }
}

/// Parse a lagged disaster term back to its lag index, within table depth.
pub(crate) fn parse_lag_term(term: &str) -> Option<usize> {
    let k = term.strip_prefix("disaster_count_lag_")?.parse::<usize>().ok()?;
    (1..=MAX_LAG).contains(&k).then_some(k)
}
