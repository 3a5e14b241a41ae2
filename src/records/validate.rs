use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::records::{ChildRecord, NewChild, SuccessStory};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("expected a JSON array of {0} rows")]
    NotAnArray(&'static str),
    #[error("expected a JSON object or array of objects")]
    InvalidPayload,
    #[error("row {index} is invalid: {reason}")]
    InvalidRow { index: usize, reason: String },
    #[error("no records supplied")]
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RejectedRow {
    pub index: usize,
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport<T> {
    pub accepted: Vec<T>,
    pub rejected: Vec<RejectedRow>,
}

impl<T> ValidationReport<T> {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

pub fn validate_children(rows: Vec<Value>) -> ValidationReport<ChildRecord> {
    validate_rows(rows, "child")
}

pub fn validate_stories(rows: Vec<Value>) -> ValidationReport<SuccessStory> {
    validate_rows(rows, "success story")
}

/// Rows that fail to deserialize (unknown enum literal, missing field, negative age) are
/// dropped and reported; they never reach the engines.
pub fn validate_rows<T: DeserializeOwned>(rows: Vec<Value>, kind: &str) -> ValidationReport<T> {
    let mut accepted = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();
    for (index, row) in rows.into_iter().enumerate() {
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        match serde_json::from_value::<T>(row) {
            Ok(record) => accepted.push(record),
            Err(error) => {
                warn!("rejected {kind} row {index} ({}): {error}", id.as_deref().unwrap_or("-"));
                rejected.push(RejectedRow {
                    index,
                    id,
                    reason: error.to_string(),
                });
            }
        }
    }
    ValidationReport { accepted, rejected }
}

/// Accepts one object or an array of objects and returns the typed insert batch.
/// Any invalid row rejects the whole batch.
pub fn parse_insert_payload(body: Value) -> Result<Vec<NewChild>, RecordError> {
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Object(_) => vec![body],
        _ => return Err(RecordError::InvalidPayload),
    };
    if rows.is_empty() {
        return Err(RecordError::Empty);
    }
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value::<NewChild>(row).map_err(|error| RecordError::InvalidRow {
                index,
                reason: error.to_string(),
            })
        })
        .collect()
}

pub fn expect_array(value: Value, kind: &'static str) -> Result<Vec<Value>, RecordError> {
    match value {
        Value::Array(rows) => Ok(rows),
        _ => Err(RecordError::NotAnArray(kind)),
    }
}
