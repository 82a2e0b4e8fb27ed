//! Per-lag regression sweep
//!
//! All six specifications read the same immutable panel and share nothing,
//! so they fit in parallel and merge back in lag order. A failure is data
//! for the caller, attached to its lag, never a reason to stop the others.

use crate::models::design::build_design;
use crate::models::ols::{fit_ols, FitError, FitSummary};
use crate::models::spec::RegressionSpec;
use crate::panel::{CountryYearRow, MAX_LAG};
use rayon::prelude::*;

/// Sweep-wide switches, one specification per lag derived from them.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub with_controls: bool,
    pub entity_fe: bool,
    pub decade_fe: bool,
    pub confidence: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            with_controls: true,
            entity_fe: true,
            decade_fe: false,
            confidence: 0.95,
        }
    }
}

impl EngineConfig {
    /// The six specifications of the sweep, lags 0 through 5.
    pub fn specs(&self) -> Vec<RegressionSpec> {
        (0..=MAX_LAG)
            .map(|lag| {
                RegressionSpec::for_lag(
                    lag,
                    self.with_controls,
                    self.entity_fe,
                    self.decade_fe,
                    self.confidence,
                )
            })
            .collect()
    }
}

/// Outcome of one lag's fit, success or labeled failure.
#[derive(Debug)]
pub struct LagFit {
    pub lag: usize,
    pub fit: Result<FitSummary, FitError>,
}

/// Fit every lag specification against the panel, in parallel, returning
/// results ordered by lag index.
pub fn run_lag_sweep(panel: &[CountryYearRow], config: &EngineConfig) -> Vec<LagFit> {
    let mut fits: Vec<LagFit> = config
        .specs()
        .into_par_iter()
        .map(|spec| {
            let lag = spec.lag;
            let fit =
                build_design(panel, &spec).and_then(|design| fit_ols(&design, spec.confidence));
            LagFit { lag, fit }
        })
        .collect();
    fits.sort_by_key(|f| f.lag);
    fits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::Controls;
    use crate::models::spec::disaster_term;

    fn count(shift: i32, year: i32) -> f64 {
        f64::from((3 * year + shift).rem_euclid(7))
    }

    /// Two entities, 2000..=2011, outcome exactly 2 x the 4-year-lagged
    /// count plus an entity offset. No noise anywhere.
    fn synthetic_panel() -> Vec<CountryYearRow> {
        let mut panel = Vec::new();
        for (idx, entity) in ["A", "B"].into_iter().enumerate() {
            let shift = 2 * idx as i32;
            let offset = 1.0 + 3.0 * idx as f64;
            for year in 2000..=2011 {
                let mut lags = [None; MAX_LAG];
                for k in 1..=MAX_LAG {
                    let source = year - k as i32;
                    if source >= 2000 {
                        lags[k - 1] = Some(count(shift, source));
                    }
                }
                let sum_security = if year - 4 >= 2000 {
                    2.0 * count(shift, year - 4) + offset
                } else {
                    0.0
                };
                panel.push(CountryYearRow {
                    entity_code: entity.to_string(),
                    year,
                    decade: (year / 10) * 10,
                    n_speeches: 3,
                    sum_security,
                    propensity: Some(0.5),
                    disaster_count: Some(count(shift, year)),
                    lags,
                    deaths: None,
                    affected: None,
                    damage_adjusted: None,
                    natural_count: None,
                    technological_count: None,
                    controls: Controls::default(),
                });
            }
        }
        panel
    }

    fn bare_config() -> EngineConfig {
        EngineConfig {
            with_controls: false,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_config_expands_to_six_specs() {
        let specs = bare_config().specs();
        assert_eq!(specs.len(), 6);
        for (lag, spec) in specs.iter().enumerate() {
            assert_eq!(spec.lag, lag);
            assert_eq!(spec.predictors[0], disaster_term(lag));
            assert!((spec.confidence - 0.95).abs() < 1e-12);
        }
    }

    #[test]
    fn test_recovers_known_lag_4_effect() {
        let panel = synthetic_panel();
        let fits = run_lag_sweep(&panel, &bare_config());

        assert_eq!(fits.len(), 6);
        assert!(fits.iter().all(|f| f.fit.is_ok()));

        let lag4 = fits[4].fit.as_ref().unwrap();
        let term = lag4.term("disaster_count_lag_4").unwrap();
        assert!((term.estimate - 2.0).abs() < 1e-6);
        assert!(term.conf_low <= 2.0 + 1e-6);
        assert!(term.conf_high >= 2.0 - 1e-6);

        // Entity offsets are absorbed exactly: intercept is A's level.
        let intercept = lag4.term("intercept").unwrap();
        assert!((intercept.estimate - 1.0).abs() < 1e-6);
        // Dummy coefficients are estimated but not reported.
        assert!(lag4.term("entity_B").is_none());
        assert!((lag4.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_entity_fails_every_lag() {
        let panel: Vec<CountryYearRow> = synthetic_panel()
            .into_iter()
            .filter(|row| row.entity_code == "A")
            .collect();

        let fits = run_lag_sweep(&panel, &bare_config());
        assert_eq!(fits.len(), 6);
        for fit in &fits {
            assert!(matches!(
                fit.fit,
                Err(FitError::InsufficientEntities { found: 1 })
            ));
        }
    }

    #[test]
    fn test_percent_scale_confidence_fails_every_lag_labeled() {
        let panel = synthetic_panel();
        let config = EngineConfig {
            confidence: 95.0,
            ..bare_config()
        };

        let fits = run_lag_sweep(&panel, &config);
        assert_eq!(fits.len(), 6);
        for fit in &fits {
            assert!(matches!(fit.fit, Err(FitError::InvalidConfidence(_))));
        }
    }

    #[test]
    fn test_failed_lags_leave_others_untouched() {
        // Only four observed years: deep lags have no data at all and the
        // lag-3 subset is too small, yet lags 0..=2 still fit.
        let panel: Vec<CountryYearRow> = synthetic_panel()
            .into_iter()
            .filter(|row| row.year <= 2003)
            .collect();

        let fits = run_lag_sweep(&panel, &bare_config());
        for (lag, fit) in fits.iter().enumerate() {
            assert_eq!(fit.lag, lag);
        }
        assert!(fits[0].fit.is_ok());
        assert!(fits[1].fit.is_ok());
        assert!(fits[2].fit.is_ok());
        assert!(matches!(
            fits[3].fit,
            Err(FitError::TooFewRows { rows: 2, params: 3 })
        ));
        assert!(matches!(fits[4].fit, Err(FitError::EmptyColumn(_))));
        assert!(matches!(fits[5].fit, Err(FitError::EmptyColumn(_))));
    }
}
