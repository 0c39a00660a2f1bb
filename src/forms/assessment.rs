//! Risk assessment planning form

use serde::Deserialize;

use super::{
    ASSESSMENT_STATUS_MAX, FormError, FormErrors, INVALID_CHOICE, NAME_MAX, date, required_text,
};
use crate::storage::{Database, NewAssessment};

pub const DATES_OUT_OF_ORDER: &str = "End date must be after start date.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RiskAssessmentForm {
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub title: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub description: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub start_date: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub end_date: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub status: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    /// User ID, blank for none
    pub assessor: String,
    /// Selected risk IDs (repeated field)
    pub risks: Vec<String>,
}

impl RiskAssessmentForm {
    pub fn selects_risk(&self, id: i64) -> bool {
        self.risks.iter().any(|r| r.trim().parse::<i64>().ok() == Some(id))
    }

    pub fn validate(&self, db: &Database) -> Result<NewAssessment, FormError> {
        let mut errors = FormErrors::new();

        let title = required_text(&mut errors, "title", &self.title, Some(NAME_MAX));
        let description = required_text(&mut errors, "description", &self.description, None);
        let status = required_text(
            &mut errors,
            "status",
            &self.status,
            Some(ASSESSMENT_STATUS_MAX),
        );
        let start_date = date(&mut errors, "start_date", &self.start_date);
        let end_date = date(&mut errors, "end_date", &self.end_date);

        if let (Some(start), Some(end)) = (start_date, end_date)
            && start > end
        {
            errors.add_non_field(DATES_OUT_OF_ORDER);
        }

        let assessor_id = match self.assessor.trim() {
            "" => None,
            raw => match raw.parse::<i64>() {
                Ok(id) if db.get_user(id)?.is_some() => Some(id),
                _ => {
                    errors.add("assessor", INVALID_CHOICE);
                    None
                }
            },
        };

        let mut risk_ids = Vec::new();
        for raw in self.risks.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            match raw.parse::<i64>() {
                Ok(id) if db.get_risk(id)?.is_some() => {
                    if !risk_ids.contains(&id) {
                        risk_ids.push(id);
                    }
                }
                _ => errors.add(
                    "risks",
                    format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        raw
                    ),
                ),
            }
        }

        errors.finish(|| {
            Some(NewAssessment {
                title: title?,
                description: description?,
                start_date: start_date?,
                end_date: end_date?,
                status: status?,
                assessor_id,
                risk_ids,
            })
        })
    }
}
