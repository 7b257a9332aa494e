//! Core enrollment record type.
//!
//! A [`Record`] is one enrollment entry. The same type is used for the
//! backing file, the per-record JSON artifact and the PDF receipt.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Identifier value meaning "not yet assigned, create on save".
pub const UNASSIGNED_ID: u64 = 0;

/// Canonical JSON field names, in receipt order.
pub const FIELD_NAMES: [&str; 7] = [
    "id",
    "documentNumber",
    "fullName",
    "program",
    "cohort",
    "enrollmentDate",
    "status",
];

/// A single enrollment entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier; [`UNASSIGNED_ID`] until the store assigns one.
    #[serde(default)]
    pub id: u64,

    /// Identity document number of the enrollee.
    #[serde(default)]
    pub document_number: Option<String>,

    /// Full name of the enrollee.
    #[serde(default)]
    pub full_name: Option<String>,

    /// Training program the enrollee is registered in.
    #[serde(default)]
    pub program: Option<String>,

    /// Cohort ("ficha") within the program.
    #[serde(default)]
    pub cohort: Option<String>,

    /// When the record was created. Stamped by the store.
    ///
    /// Written without an offset; offset timestamps are read as the wall
    /// time they name.
    #[serde(default, deserialize_with = "deserialize_enrollment_date")]
    pub enrollment_date: NaiveDateTime,

    /// Free-text status, e.g. `Active`.
    #[serde(default)]
    pub status: Option<String>,
}

impl Record {
    /// Create an unsaved record with the required fields filled in.
    #[must_use]
    pub fn new(
        document_number: impl Into<String>,
        full_name: impl Into<String>,
        program: impl Into<String>,
        cohort: impl Into<String>,
    ) -> Self {
        Self {
            id: UNASSIGNED_ID,
            document_number: Some(document_number.into()),
            full_name: Some(full_name.into()),
            program: Some(program.into()),
            cohort: Some(cohort.into()),
            enrollment_date: NaiveDateTime::default(),
            status: None,
        }
    }

    /// Set the status, builder style.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Whether the store should treat this record as new.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.id == UNASSIGNED_ID
    }

    /// Whether the status is absent or blank.
    #[must_use]
    pub fn has_status(&self) -> bool {
        self.status.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    /// Check that every required text field is present and non-blank.
    ///
    /// The store never calls this; it is the caller's contract.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("documentNumber", &self.document_number),
            ("fullName", &self.full_name),
            ("program", &self.program),
            ("cohort", &self.cohort),
        ];
        for (field, value) in required {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                return Err(Error::validation(field, "is required"));
            }
        }
        Ok(())
    }

    /// Decode one record from a JSON value, matching field names
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the value is not a record.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(canonicalize_keys(value))
    }
}

/// Decode a list of records from the text of a backing file.
///
/// A literal `null` document decodes to an empty list.
///
/// # Errors
///
/// Returns the `serde_json` error if the text is not a record array.
pub fn records_from_str(text: &str) -> serde_json::Result<Vec<Record>> {
    let value: Value = serde_json::from_str(text)?;
    let canonical = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize_keys).collect()),
        other => other,
    };
    serde_json::from_value(canonical)
}

/// Parse an enrollment timestamp, with or without a UTC offset.
///
/// `2025-03-14T09:26:53.1234567-05:00` becomes `2025-03-14T09:26:53.1234567`.
///
/// # Errors
///
/// Returns the `chrono` parse error when neither form matches.
pub fn parse_enrollment_date(text: &str) -> chrono::ParseResult<NaiveDateTime> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.naive_local())
        .or_else(|_| text.parse::<NaiveDateTime>())
}

fn deserialize_enrollment_date<'de, D>(
    deserializer: D,
) -> std::result::Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_enrollment_date(&text).map_err(serde::de::Error::custom)
}

/// Rename object keys to their canonical spelling when they match a
/// known field ignoring ASCII case. Unknown keys are left alone.
fn canonicalize_keys(value: Value) -> Value {
    let Value::Object(fields) = value else {
        return value;
    };
    let canonical: Map<String, Value> = fields
        .into_iter()
        .map(|(key, v)| {
            let name = FIELD_NAMES
                .iter()
                .find(|name| name.eq_ignore_ascii_case(&key))
                .map_or(key, |name| (*name).to_string());
            (name, v)
        })
        .collect();
    Value::Object(canonical)
}
