//! Heuristic field extraction from OCR text.
//!
//! Identity cards lay their fields out positionally: the card number sits on
//! or just below an "ID" line, the last name below the number, and the given
//! names below that. We anchor on the ID line and read the following lines by
//! index, with free-floating regex matches for the DOB and sex markers.

use std::sync::LazyLock;

use regex::Regex;

/// A 9-digit card number filling a whole line, e.g. `123 456 789`.
static CARD_NUMBER_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{3}\s?\d{3}\s?\d{3}$").expect("failed to compile regex")
});

/// An `ID` marker with the card number on the same line.
static INLINE_CARD_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ID\s*[:#]?\s*(\d{3}\s?\d{3}\s?\d{3})").expect("failed to compile regex")
});

/// A date-of-birth marker. The capture is kept as an opaque string; we make
/// no attempt to decide between DD/MM and MM/DD.
static DOB_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"DOB\s*[:#]?\s*(\d{2}/\d{2}/\d{4})").expect("failed to compile regex")
});

/// A standalone `M` or `F` token, optionally prefixed with `SEX`.
static SEX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:SEX[:\s]*)?(M|F)\b").expect("failed to compile regex")
});

/// Fields recognized on an identity document.
///
/// Each field stays `None` until the scan finds a value for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
}

impl ExtractedFields {
    /// Scan a block of OCR text for identity fields.
    ///
    /// A single forward pass over the lines. Later matches overwrite earlier
    /// ones, so when a document carries several ID-like lines the last one in
    /// reading order decides where the name lines are.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut fields = Self::default();
        let mut last_name_index: Option<usize> = None;

        for (i, line) in lines.iter().enumerate() {
            if line.contains("ID") {
                if i + 1 < lines.len() && CARD_NUMBER_LINE_REGEX.is_match(lines[i + 1]) {
                    // The number fills the next line; the last name follows it.
                    last_name_index = Some(i + 2);
                } else if INLINE_CARD_NUMBER_REGEX.is_match(line) {
                    last_name_index = Some(i + 1);
                }
            }

            // Re-derived on every iteration, not just when the anchor moves,
            // so that a later ID line retargets all three name fields.
            if let Some(idx) = last_name_index {
                if idx < lines.len() {
                    fields.last_name = Some(lines[idx].trim().to_string());
                }
                if idx + 1 < lines.len() {
                    // Assigned unconditionally: a sparser name line under a
                    // later anchor clears values from the superseded one.
                    let mut tokens = lines[idx + 1].split_whitespace();
                    fields.first_name = tokens.next().map(str::to_string);
                    let rest = tokens.collect::<Vec<_>>().join(" ");
                    fields.middle_name = (!rest.is_empty()).then_some(rest);
                }
            }

            if let Some(caps) = DOB_REGEX.captures(line) {
                fields.dob = Some(caps[1].to_string());
            }

            if let Some(caps) = SEX_REGEX.captures(line) {
                let gender = if &caps[1] == "M" { "Male" } else { "Female" };
                fields.gender = Some(gender.to_string());
            }
        }

        fields
    }
}
