//! Risk response form

use serde::Deserialize;

use super::risk::mitigation_plan;
use super::{FormError, FormErrors, choice, optional_text};
use crate::domain::{ResponseType, RiskStatus};
use crate::storage::{ResponseDecision, Risk, RiskResponse, RiskResponseUpdate};

pub const DETAILS_WITHOUT_TYPE: &str = "Choose a response type to record response details.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RiskResponseForm {
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub status: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub mitigation_plan: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub response_type: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub response_details: String,
}

impl RiskResponseForm {
    /// Prefilled from the current state of a risk
    pub fn for_risk(risk: &Risk, response: Option<&RiskResponse>) -> Self {
        Self {
            status: risk.status.as_str().to_string(),
            mitigation_plan: risk.mitigation_plan.clone().unwrap_or_default(),
            response_type: response
                .map(|r| r.response_type.as_str().to_string())
                .unwrap_or_default(),
            response_details: response.map(|r| r.details.clone()).unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<RiskResponseUpdate, FormError> {
        let mut errors = FormErrors::new();

        let status = choice::<RiskStatus>(&mut errors, "status", &self.status);
        let plan = mitigation_plan(&mut errors, status, &self.mitigation_plan);

        let details = optional_text(&self.response_details);
        let response = if self.response_type.trim().is_empty() {
            if details.is_some() {
                errors.add("response_type", DETAILS_WITHOUT_TYPE);
            }
            Some(None)
        } else {
            choice::<ResponseType>(&mut errors, "response_type", &self.response_type).map(
                |response_type| {
                    Some(ResponseDecision {
                        response_type,
                        details: details.unwrap_or_default(),
                    })
                },
            )
        };

        errors.finish(|| {
            Some(RiskResponseUpdate {
                status: status?,
                mitigation_plan: plan,
                response: response?,
            })
        })
    }
}
