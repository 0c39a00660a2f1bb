//! Form input validation
//!
//! Each form holds the raw submitted strings so a rejected submission can be
//! rendered again exactly as typed. `validate` either returns a draft ready
//! for the storage layer or every problem found, keyed by field.
//!
//! # Module Structure
//! - `asset`: AssetForm, VulnerabilityForm
//! - `threat`: ThreatForm
//! - `risk`: RiskForm, ImpactForm
//! - `response`: RiskResponseForm
//! - `assessment`: RiskAssessmentForm

mod assessment;
mod asset;
mod response;
mod risk;
mod threat;

pub use assessment::RiskAssessmentForm;
pub use asset::{AssetForm, VulnerabilityForm};
pub use response::RiskResponseForm;
pub use risk::{ImpactForm, RiskForm};
pub use threat::ThreatForm;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{SCORE_MAX, SCORE_MIN, in_score_range};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_INTEGER: &str = "Enter a whole number.";
pub const INVALID_DATE: &str = "Enter a valid date.";

/// Maximum lengths of the bounded text fields
pub const NAME_MAX: usize = 200;
pub const CATEGORY_MAX: usize = 100;
pub const ASSESSMENT_STATUS_MAX: usize = 50;
pub const USERNAME_MAX: usize = 150;

/// Validation messages collected from one submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    /// Messages attached to one field
    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Messages about the form as a whole
    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum::<usize>() + self.non_field.len()
    }

    /// `Ok(value)` when nothing was reported
    pub fn finish<T>(self, value: impl FnOnce() -> Option<T>) -> Result<T, FormError> {
        if !self.is_empty() {
            return Err(FormError::Invalid(self));
        }
        // Every cleaner that returned None also recorded an error
        value().ok_or(FormError::Invalid(self))
    }
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("submission has {} validation error(s)", .0.len())]
    Invalid(FormErrors),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Single-value field that keeps the last value when a key is repeated
pub(crate) fn last_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<String>::deserialize(deserializer)?;
    Ok(values.into_iter().next_back().unwrap_or_default())
}

fn too_long(max: usize, len: usize) -> String {
    format!(
        "Ensure this value has at most {} characters (it has {}).",
        max, len
    )
}

/// Trimmed, non-empty text, optionally bounded in length
pub(crate) fn required_text(
    errors: &mut FormErrors,
    field: &'static str,
    raw: &str,
    max: Option<usize>,
) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    if let Some(max) = max {
        let len = value.chars().count();
        if len > max {
            errors.add(field, too_long(max, len));
            return None;
        }
    }
    Some(value.to_string())
}

/// Login name for a new account, trimmed; the error is the field message
pub fn username(raw: &str) -> Result<String, String> {
    let mut errors = FormErrors::new();
    required_text(&mut errors, "username", raw, Some(USERNAME_MAX))
        .ok_or_else(|| errors.field("username").concat())
}

/// Trimmed text, `None` when blank
pub(crate) fn optional_text(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub(crate) fn required_int(errors: &mut FormErrors, field: &'static str, raw: &str) -> Option<i64> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.add(field, INVALID_INTEGER);
            None
        }
    }
}

/// A 1–10 rating such as severity, likelihood or impact
pub(crate) fn rating(
    errors: &mut FormErrors,
    field: &'static str,
    label: &str,
    raw: &str,
) -> Option<i64> {
    let value = required_int(errors, field, raw)?;
    if !in_score_range(value) {
        errors.add(
            field,
            format!("{} must be between {} and {}.", label, SCORE_MIN, SCORE_MAX),
        );
        return None;
    }
    Some(value)
}

/// One of a fixed set of choices
pub(crate) fn choice<T: FromStr>(
    errors: &mut FormErrors,
    field: &'static str,
    raw: &str,
) -> Option<T> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(
                field,
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    value
                ),
            );
            None
        }
    }
}

/// ISO `YYYY-MM-DD` date
pub(crate) fn date(errors: &mut FormErrors, field: &'static str, raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(_) => {
            errors.add(field, INVALID_DATE);
            None
        }
    }
}

/// ID of a referenced record; whether it exists is checked by the caller
pub(crate) fn reference_id(
    errors: &mut FormErrors,
    field: &'static str,
    raw: &str,
) -> Option<i64> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    match value.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}
