//! Design-matrix assembly
//!
//! Turns a panel plus a [`RegressionSpec`] into dense arrays for the
//! solver. Complete-case filtering happens here, per specification: a row
//! missing any selected term drops out of this fit only. Fixed effects are
//! expanded as explicit one-hot dummies with the lexicographically first
//! entity (and the earliest decade) absorbed by the intercept as the
//! reference level.

use crate::models::ols::FitError;
use crate::models::spec::{parse_lag_term, RegressionSpec};
use crate::panel::CountryYearRow;
use ndarray::{Array1, Array2};
use std::collections::BTreeSet;

/// Dense design ready for the solver. Named columns (intercept first, then
/// predictors in specification order) occupy the first `n_base` columns;
/// dummy columns follow.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    /// One name per column of `x`, dummies included.
    pub names: Vec<String>,
    pub n_base: usize,
}

/// Resolve a term name against one panel row. Missing stays missing; it is
/// never substituted with 0 here. The propensity score is a diagnostic
/// attribute, not a model term.
pub(crate) fn term_value(row: &CountryYearRow, term: &str) -> Option<f64> {
    match term {
        "sum_security" => Some(row.sum_security),
        "n_speeches" => Some(row.n_speeches as f64),
        "disaster_count" => row.disaster_count,
        "deaths" => row.deaths,
        "affected" => row.affected,
        "damage_adjusted" => row.damage_adjusted,
        "natural_count" => row.natural_count,
        "technological_count" => row.technological_count,
        "gdp_per_capita" => row.controls.gdp_per_capita,
        "log_population" => row.controls.log_population,
        "regime_type" => row.controls.regime_type,
        "military_expenditure" => row.controls.military_expenditure,
        "warming" => row.controls.warming,
        "agreement_usa" => row.controls.agreement_usa,
        "concern" => row.controls.concern,
        other => parse_lag_term(other).and_then(|k| row.disaster_at_lag(k)),
    }
}

fn validate_term(term: &str) -> Result<(), FitError> {
    match term {
        "sum_security" | "n_speeches" | "disaster_count" | "deaths" | "affected"
        | "damage_adjusted" | "natural_count" | "technological_count" | "gdp_per_capita"
        | "log_population" | "regime_type" | "military_expenditure" | "warming"
        | "agreement_usa" | "concern" => Ok(()),
        other if parse_lag_term(other).is_some() => Ok(()),
        other => Err(FitError::UnknownTerm(other.to_string())),
    }
}

/// Assemble the design matrix for one specification.
pub fn build_design(
    panel: &[CountryYearRow],
    spec: &RegressionSpec,
) -> Result<DesignMatrix, FitError> {
    validate_term(&spec.outcome)?;
    for term in &spec.predictors {
        validate_term(term)?;
    }
    if panel.is_empty() {
        return Err(FitError::NoCompleteRows);
    }

    for term in &spec.predictors {
        if !panel.iter().any(|row| term_value(row, term).is_some()) {
            return Err(FitError::EmptyColumn(term.clone()));
        }
    }

    let mut kept: Vec<(&CountryYearRow, f64, Vec<f64>)> = Vec::new();
    for row in panel {
        let outcome = match term_value(row, &spec.outcome) {
            Some(value) => value,
            None => continue,
        };
        let values: Option<Vec<f64>> = spec
            .predictors
            .iter()
            .map(|term| term_value(row, term))
            .collect();
        if let Some(values) = values {
            kept.push((row, outcome, values));
        }
    }
    if kept.is_empty() {
        return Err(FitError::NoCompleteRows);
    }

    let entity_levels: Vec<&str> = kept
        .iter()
        .map(|(row, ..)| row.entity_code.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if spec.entity_fe && entity_levels.len() < 2 {
        return Err(FitError::InsufficientEntities {
            found: entity_levels.len(),
        });
    }
    let decade_levels: Vec<i32> = kept
        .iter()
        .map(|(row, ..)| row.decade)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let entity_dummies = if spec.entity_fe {
        entity_levels.len() - 1
    } else {
        0
    };
    let decade_dummies = if spec.decade_fe {
        decade_levels.len() - 1
    } else {
        0
    };

    let n = kept.len();
    let n_base = 1 + spec.predictors.len();
    let p = n_base + entity_dummies + decade_dummies;
    if n <= p {
        return Err(FitError::TooFewRows { rows: n, params: p });
    }

    let mut names = Vec::with_capacity(p);
    names.push("intercept".to_string());
    names.extend(spec.predictors.iter().cloned());
    if spec.entity_fe {
        names.extend(entity_levels[1..].iter().map(|e| format!("entity_{e}")));
    }
    if spec.decade_fe {
        names.extend(decade_levels[1..].iter().map(|d| format!("decade_{d}")));
    }

    let mut x = Array2::<f64>::zeros((n, p));
    let mut y = Array1::<f64>::zeros(n);
    for (i, (row, outcome, values)) in kept.iter().enumerate() {
        y[i] = *outcome;
        x[[i, 0]] = 1.0;
        for (j, value) in values.iter().enumerate() {
            x[[i, 1 + j]] = *value;
        }
        if spec.entity_fe {
            if let Some(pos) = entity_levels[1..]
                .iter()
                .position(|e| *e == row.entity_code.as_str())
            {
                x[[i, n_base + pos]] = 1.0;
            }
        }
        if spec.decade_fe {
            if let Some(pos) = decade_levels[1..].iter().position(|d| *d == row.decade) {
                x[[i, n_base + entity_dummies + pos]] = 1.0;
            }
        }
    }

    Ok(DesignMatrix { x, y, names, n_base })
}
