//! The JSON body returned for a processed upload.

use serde::Serialize;

use crate::fields::ExtractedFields;

/// Downstream token metadata stores these in a 10-character symbol field.
const MAX_FIELD_LEN: usize = 10;

/// Take at most the first [`MAX_FIELD_LEN`] characters of a string.
fn truncate(s: &str) -> String {
    s.chars().take(MAX_FIELD_LEN).collect()
}

/// Drop empty strings so they serialize as absent keys.
fn drop_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Response body for a processed upload.
///
/// Only keys with non-empty values appear in the serialized JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponsePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// The truncated first and last names run together, truncated again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined: Option<String>,
}

impl From<ExtractedFields> for ResponsePayload {
    fn from(fields: ExtractedFields) -> Self {
        let had_name = fields.first_name.is_some() || fields.last_name.is_some();
        let first_name = drop_empty(fields.first_name).map(|s| truncate(&s));
        let last_name = drop_empty(fields.last_name).map(|s| truncate(&s));

        let combined = had_name.then(|| {
            let joined = format!(
                "{}{}",
                first_name.as_deref().unwrap_or(""),
                last_name.as_deref().unwrap_or("")
            );
            truncate(joined.trim())
        });

        Self {
            first_name,
            middle_name: drop_empty(fields.middle_name),
            last_name,
            dob: drop_empty(fields.dob),
            gender: drop_empty(fields.gender),
            combined: drop_empty(combined),
        }
    }
}
