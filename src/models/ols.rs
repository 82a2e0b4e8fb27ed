//! Ordinary least squares with classical inference
//!
//! Solves the normal equations by Cholesky decomposition and reports, for
//! every named term, the estimate, standard error, t statistic, two-sided
//! p-value, and confidence interval at the requested level. Rank-deficient
//! designs fail with [`FitError::Singular`] instead of being nudged into
//! invertibility; a silently regularized fixed-effects fit would report
//! coefficients nobody can interpret.

use crate::models::design::DesignMatrix;
use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

/// A diagonal pivot at or below this is treated as rank deficiency.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Why a single lag specification could not be fitted. Failures are
/// per-specification and never abort the rest of the sweep.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("Unknown model term {0:?}")]
    UnknownTerm(String),

    #[error("Predictor {0:?} has no observed value in the panel")]
    EmptyColumn(String),

    #[error("No complete rows left after dropping missing values")]
    NoCompleteRows,

    #[error("{rows} complete rows cannot identify {params} parameters")]
    TooFewRows { rows: usize, params: usize },

    #[error("Entity fixed effects need at least 2 distinct entities, found {found}")]
    InsufficientEntities { found: usize },

    #[error("Confidence level {0} is not strictly between 0 and 1")]
    InvalidConfidence(f64),

    #[error("Normal equations are singular; the design matrix is rank deficient")]
    Singular,

    #[error("Computation error: {0}")]
    Computation(String),
}

/// Inference for one named term.
#[derive(Debug, Clone)]
pub struct TermEstimate {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
    pub conf_low: f64,
    pub conf_high: f64,
}

/// One fitted specification.
#[derive(Debug, Clone)]
pub struct FitSummary {
    /// Named terms only (intercept and predictors); fixed-effect dummies
    /// are estimated but not reported.
    pub terms: Vec<TermEstimate>,
    pub n_obs: usize,
    pub df_resid: usize,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub confidence: f64,
}

impl FitSummary {
    /// Look up a reported term by name.
    pub fn term(&self, name: &str) -> Option<&TermEstimate> {
        self.terms.iter().find(|t| t.term == name)
    }
}

/// Fit by OLS and derive classical standard errors from the unscaled
/// covariance diagonal of (X'X)^-1. The confidence level must lie strictly
/// between 0 and 1; a percent-scale value like 95 is rejected here, before
/// the Student-t quantile ever sees it.
pub fn fit_ols(design: &DesignMatrix, confidence: f64) -> Result<FitSummary, FitError> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(FitError::InvalidConfidence(confidence));
    }

    let x = &design.x;
    let y = &design.y;
    let n = x.nrows();
    let p = x.ncols();
    if n <= p {
        return Err(FitError::TooFewRows { rows: n, params: p });
    }

    // Normal equations: (X'X) beta = X'y
    let xt = x.t();
    let xtx = xt.dot(x);
    let xty = xt.dot(y);

    let factor = cholesky(&xtx)?;
    let beta = solve_with_factor(&factor, &xty);

    let fitted = x.dot(&beta);
    let ss_res: f64 = y
        .iter()
        .zip(fitted.iter())
        .map(|(&yi, &fi)| (yi - fi).powi(2))
        .sum();
    let y_mean = y.mean().unwrap_or(0.0);
    let ss_tot: f64 = y.iter().map(|&yi| (yi - y_mean).powi(2)).sum();

    let df = n - p;
    let sigma2 = ss_res / df as f64;

    let dist = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| FitError::Computation(e.to_string()))?;
    let alpha = 1.0 - confidence;
    let t_crit = dist.inverse_cdf(1.0 - alpha / 2.0);

    let mut terms = Vec::with_capacity(design.n_base);
    for j in 0..design.n_base {
        let estimate = beta[j];
        let variance = sigma2 * inverse_diagonal(&factor, j);
        let std_error = variance.max(0.0).sqrt();
        let (t_value, p_value) = if std_error > 0.0 {
            let t = estimate / std_error;
            (t, 2.0 * (1.0 - dist.cdf(t.abs())))
        } else if estimate == 0.0 {
            (0.0, 1.0)
        } else {
            (f64::INFINITY * estimate.signum(), 0.0)
        };
        terms.push(TermEstimate {
            term: design.names[j].clone(),
            estimate,
            std_error,
            t_value,
            p_value,
            conf_low: estimate - t_crit * std_error,
            conf_high: estimate + t_crit * std_error,
        });
    }

    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };
    let adj_r_squared = if ss_tot > 0.0 {
        1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / df as f64
    } else {
        0.0
    };

    Ok(FitSummary {
        terms,
        n_obs: n,
        df_resid: df,
        r_squared,
        adj_r_squared,
        confidence,
    })
}

/// Cholesky decomposition A = L L^T for symmetric positive definite A.
fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>, FitError> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= PIVOT_TOLERANCE {
                    return Err(FitError::Singular);
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Ok(l)
}

/// Solve L L^T x = b given the Cholesky factor L.
fn solve_with_factor(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    // Forward substitution: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * z[j];
        }
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    x
}

/// Diagonal entry j of (X'X)^-1, via a unit-vector solve against the factor.
fn inverse_diagonal(l: &Array2<f64>, j: usize) -> f64 {
    let mut unit = Array1::<f64>::zeros(l.nrows());
    unit[j] = 1.0;
    solve_with_factor(l, &unit)[j]
}
