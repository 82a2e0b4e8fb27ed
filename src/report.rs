//! Results collection and output artifacts
//!
//! Pulls the disaster-exposure term out of every fitted lag specification
//! into one table ordered by lag, keeps failed lags next to it as labeled
//! entries, and renders/saves the lot (text, CSV, JSON). The aggregated
//! panel itself is also writable for inspection outside the pipeline.

use crate::models::{disaster_term, LagFit};
use crate::panel::{CountryYearRow, MAX_LAG};
use anyhow::{Context, Result};
use csv::Writer;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::path::Path;
use tracing::warn;

/// One row of the per-lag disaster-term table.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionResult {
    pub lag: usize,
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
    pub conf_low: f64,
    pub conf_high: f64,
}

/// A lag whose fit failed, labeled instead of dropped.
#[derive(Debug, Clone, Serialize)]
pub struct LagFailure {
    pub lag: usize,
    pub reason: String,
}

/// Final sweep output: disaster-term rows ordered by lag plus any failures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultsTable {
    pub rows: Vec<RegressionResult>,
    pub failures: Vec<LagFailure>,
}

/// Keep only each lag's disaster-exposure term, in lag order. Fit failures
/// become labeled entries; nothing disappears silently.
pub fn collect_disaster_terms(fits: &[LagFit]) -> ResultsTable {
    let mut table = ResultsTable::default();

    for lag_fit in fits {
        match &lag_fit.fit {
            Ok(summary) => {
                let name = disaster_term(lag_fit.lag);
                match summary.term(&name) {
                    Some(term) => table.rows.push(RegressionResult {
                        lag: lag_fit.lag,
                        term: term.term.clone(),
                        estimate: term.estimate,
                        std_error: term.std_error,
                        t_value: term.t_value,
                        p_value: term.p_value,
                        conf_low: term.conf_low,
                        conf_high: term.conf_high,
                    }),
                    None => table.failures.push(LagFailure {
                        lag: lag_fit.lag,
                        reason: format!("fitted model reports no {name} term"),
                    }),
                }
            }
            Err(err) => table.failures.push(LagFailure {
                lag: lag_fit.lag,
                reason: err.to_string(),
            }),
        }
    }

    if !table.failures.is_empty() {
        warn!(
            failed = table.failures.len(),
            fitted = table.rows.len(),
            "some lag specifications did not fit"
        );
    }
    table
}

/// Render the sweep as a plain-text table, one line per lag.
pub fn render_report(fits: &[LagFit]) -> String {
    let mut out = String::new();
    out.push_str("Disaster exposure and securitized climate speech\n");
    let _ = writeln!(out, "{:-<78}", "");
    let _ = writeln!(
        out,
        "{:<4} {:<24} {:>10} {:>9} {:>8} {:>8} {:>5} {:>6}",
        "lag", "term", "estimate", "std.err", "ci.low", "ci.high", "n", "R2"
    );
    let _ = writeln!(out, "{:-<78}", "");

    for lag_fit in fits {
        match &lag_fit.fit {
            Ok(summary) => {
                let name = disaster_term(lag_fit.lag);
                if let Some(term) = summary.term(&name) {
                    let _ = writeln!(
                        out,
                        "{:<4} {:<24} {:>10.4} {:>9.4} {:>8.3} {:>8.3} {:>5} {:>6.3}",
                        lag_fit.lag,
                        term.term,
                        term.estimate,
                        term.std_error,
                        term.conf_low,
                        term.conf_high,
                        summary.n_obs,
                        summary.r_squared
                    );
                }
            }
            Err(err) => {
                let _ = writeln!(out, "{:<4} failed: {err}", lag_fit.lag);
            }
        }
    }

    if let Some(summary) = fits.iter().find_map(|f| f.fit.as_ref().ok()) {
        let _ = writeln!(out, "{:-<78}", "");
        let _ = writeln!(
            out,
            "two-sided intervals at {:.0}% confidence",
            summary.confidence * 100.0
        );
    }
    out
}

/// Write the disaster-term rows as CSV. Failures are not rows; they travel
/// in the JSON export and the log.
pub fn save_results_csv<P: AsRef<Path>>(path: P, table: &ResultsTable) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("failed to create {path:?}"))?;
    let mut writer = Writer::from_writer(file);
    for row in &table.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the whole table, failures included, as pretty JSON.
pub fn save_results_json<P: AsRef<Path>>(path: P, table: &ResultsTable) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(table)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {path:?}"))?;
    Ok(())
}

/// Write the aggregated panel as CSV, empty fields for missing values.
pub fn save_panel<P: AsRef<Path>>(path: P, panel: &[CountryYearRow]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("failed to create {path:?}"))?;
    let mut writer = Writer::from_writer(file);

    let mut header = vec![
        "entity_code".to_string(),
        "year".to_string(),
        "decade".to_string(),
        "n_speeches".to_string(),
        "sum_security".to_string(),
        "propensity".to_string(),
        "disaster_count".to_string(),
    ];
    for k in 1..=MAX_LAG {
        header.push(format!("disaster_count_lag_{k}"));
    }
    header.extend(
        [
            "deaths",
            "affected",
            "damage_adjusted",
            "natural_count",
            "technological_count",
            "gdp_per_capita",
            "log_population",
            "regime_type",
            "military_expenditure",
            "warming",
            "agreement_usa",
            "concern",
        ]
        .into_iter()
        .map(String::from),
    );
    writer.write_record(&header)?;

    for row in panel {
        let mut record = vec![
            row.entity_code.clone(),
            row.year.to_string(),
            row.decade.to_string(),
            row.n_speeches.to_string(),
            row.sum_security.to_string(),
            opt(row.propensity),
            opt(row.disaster_count),
        ];
        for lag in row.lags {
            record.push(opt(lag));
        }
        record.push(opt(row.deaths));
        record.push(opt(row.affected));
        record.push(opt(row.damage_adjusted));
        record.push(opt(row.natural_count));
        record.push(opt(row.technological_count));
        record.push(opt(row.controls.gdp_per_capita));
        record.push(opt(row.controls.log_population));
        record.push(opt(row.controls.regime_type));
        record.push(opt(row.controls.military_expenditure));
        record.push(opt(row.controls.warming));
        record.push(opt(row.controls.agreement_usa));
        record.push(opt(row.controls.concern));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
