//! Threat form

use serde::Deserialize;

use super::{FormError, FormErrors, NAME_MAX, choice, rating, required_text};
use crate::domain::ThreatType;
use crate::storage::NewThreat;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ThreatForm {
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub name: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub description: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub threat_type: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub likelihood: String,
}

impl ThreatForm {
    pub fn validate(&self) -> Result<NewThreat, FormError> {
        let mut errors = FormErrors::new();

        let name = required_text(&mut errors, "name", &self.name, Some(NAME_MAX));
        let description = required_text(&mut errors, "description", &self.description, None);
        let threat_type = choice::<ThreatType>(&mut errors, "threat_type", &self.threat_type);
        let likelihood = rating(&mut errors, "likelihood", "Likelihood", &self.likelihood);

        errors.finish(|| {
            Some(NewThreat {
                name: name?,
                description: description?,
                threat_type: threat_type?,
                likelihood: likelihood?,
            })
        })
    }
}
