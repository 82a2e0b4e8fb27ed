//! # Disaster Exposure and Climate Securitization
//!
//! This library builds country-year panels linking natural and
//! technological disaster exposure to securitized climate speech, then fits
//! a sweep of lagged fixed-effects regressions over them.
//!
//! ## Modules
//!
//! - `data` - record types and CSV ingestion with schema validation
//! - `panel` - disaster aggregation, entity scoring, merge, lags, collapse
//! - `models` - regression specifications, design matrices, OLS, lag sweep
//! - `report` - results collection, text/CSV/JSON output

pub mod data;
pub mod models;
pub mod panel;
pub mod report;

pub use data::loader::SchemaError;
pub use data::types::{DisasterEvent, SpeechRecord, TopicFlag};
pub use models::engine::{run_lag_sweep, EngineConfig, LagFit};
pub use models::ols::{FitError, FitSummary};
pub use models::spec::RegressionSpec;
pub use panel::aggregate::{CountryYearRow, SpeechFilter};
pub use panel::build_panel;
pub use report::{collect_disaster_terms, render_report, RegressionResult, ResultsTable};
