//! Tabular input loading with schema validation
//!
//! All three source tables arrive as CSV with a header row. Required columns
//! are checked up front, field types and enum values during deserialization,
//! and cross-field invariants (disaster intervals) immediately after. Any
//! violation is a fatal [`SchemaError`]; nothing is coerced or skipped.

use crate::data::types::{ControlRecord, DisasterEvent, SpeechRecord};
use anyhow::{Context, Result};
use csv::{Reader, Writer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fatal ingestion errors. A single bad row aborts the whole run.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?}: missing required column {column:?}")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path:?} row {row}: {source}")]
    BadRecord {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("{path:?} row {row}: disaster interval {start_year}..{end_year} ends before it starts")]
    InvalidInterval {
        path: PathBuf,
        row: usize,
        start_year: i32,
        end_year: i32,
    },
}

const SPEECH_COLUMNS: &[&str] = &["doc_id", "entity_code", "year", "topic_flag"];
const DISASTER_COLUMNS: &[&str] = &[
    "entity_code",
    "start_year",
    "end_year",
    "type",
    "subtype",
    "group",
    "deaths",
    "affected",
    "damage_adjusted",
];
const CONTROL_COLUMNS: &[&str] = &["doc_id"];

/// Load classified speech records, sorted by entity and year.
pub fn load_speeches<P: AsRef<Path>>(path: P) -> Result<Vec<SpeechRecord>, SchemaError> {
    let mut speeches: Vec<SpeechRecord> = read_rows(path.as_ref(), SPEECH_COLUMNS)?;
    speeches.sort_by(|a, b| {
        (a.entity_code.as_str(), a.year, a.doc_id.as_str())
            .cmp(&(b.entity_code.as_str(), b.year, b.doc_id.as_str()))
    });
    Ok(speeches)
}

/// Load disaster events, rejecting intervals that end before they start.
/// The `duration >= 1` invariant every later stage relies on is enforced
/// exactly here.
pub fn load_disasters<P: AsRef<Path>>(path: P) -> Result<Vec<DisasterEvent>, SchemaError> {
    let path = path.as_ref();
    let mut events: Vec<DisasterEvent> = read_rows(path, DISASTER_COLUMNS)?;
    for (i, event) in events.iter().enumerate() {
        if event.end_year < event.start_year {
            return Err(SchemaError::InvalidInterval {
                path: path.to_path_buf(),
                row: i + 2,
                start_year: event.start_year,
                end_year: event.end_year,
            });
        }
    }
    events.sort_by(|a, b| {
        (a.entity_code.as_str(), a.start_year).cmp(&(b.entity_code.as_str(), b.start_year))
    });
    Ok(events)
}

/// Load per-document control covariates. Only `doc_id` is required; absent
/// covariate columns and empty fields both read as missing.
pub fn load_controls<P: AsRef<Path>>(path: P) -> Result<Vec<ControlRecord>, SchemaError> {
    read_rows(path.as_ref(), CONTROL_COLUMNS)
}

/// Save speech records to CSV (header row included).
pub fn save_speeches<P: AsRef<Path>>(path: P, speeches: &[SpeechRecord]) -> Result<()> {
    save_rows(path.as_ref(), speeches)
}

/// Save disaster events to CSV (header row included).
pub fn save_disasters<P: AsRef<Path>>(path: P, events: &[DisasterEvent]) -> Result<()> {
    save_rows(path.as_ref(), events)
}

fn read_rows<T: DeserializeOwned>(
    path: &Path,
    required: &[&'static str],
) -> Result<Vec<T>, SchemaError> {
    let file = File::open(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| SchemaError::BadRecord {
            path: path.to_path_buf(),
            row: 1,
            source,
        })?
        .clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(SchemaError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<T>().enumerate() {
        // Header occupies row 1, so data rows are 1-based from 2.
        let row = result.map_err(|source| SchemaError::BadRecord {
            path: path.to_path_buf(),
            row: i + 2,
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn save_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {path:?}"))?;
    let mut writer = Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
