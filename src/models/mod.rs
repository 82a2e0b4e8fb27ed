pub mod design;
pub mod engine;
pub mod ols;
pub mod spec;

pub use design::{build_design, DesignMatrix};
pub use engine::{run_lag_sweep, EngineConfig, LagFit};
pub use ols::{fit_ols, FitError, FitSummary, TermEstimate};
pub use spec::{disaster_term, RegressionSpec, CONTROL_TERMS, OUTCOME_TERM};
