//! Asset and vulnerability forms

use serde::Deserialize;

use super::{
    CATEGORY_MAX, FormError, FormErrors, INVALID_CHOICE, NAME_MAX, REQUIRED, rating,
    reference_id, required_text,
};
use crate::domain::Money;
use crate::storage::{Database, NewAsset, NewVulnerability};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssetForm {
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub name: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub description: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub value: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub category: String,
}

impl AssetForm {
    pub fn validate(&self) -> Result<NewAsset, FormError> {
        let mut errors = FormErrors::new();

        let name = required_text(&mut errors, "name", &self.name, Some(NAME_MAX));
        let description = required_text(&mut errors, "description", &self.description, None);
        let category = required_text(&mut errors, "category", &self.category, Some(CATEGORY_MAX));

        let value = if self.value.trim().is_empty() {
            errors.add("value", REQUIRED);
            None
        } else {
            self.value
                .parse::<Money>()
                .map_err(|e| errors.add("value", e.to_string()))
                .ok()
        };

        errors.finish(|| {
            Some(NewAsset {
                name: name?,
                description: description?,
                value: value?,
                category: category?,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VulnerabilityForm {
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub name: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub description: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub asset: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub severity: String,
}

impl VulnerabilityForm {
    pub fn validate(&self, db: &Database) -> Result<NewVulnerability, FormError> {
        let mut errors = FormErrors::new();

        let name = required_text(&mut errors, "name", &self.name, Some(NAME_MAX));
        let description = required_text(&mut errors, "description", &self.description, None);
        let severity = rating(&mut errors, "severity", "Severity", &self.severity);

        let mut asset_id = reference_id(&mut errors, "asset", &self.asset);
        if let Some(id) = asset_id
            && db.get_asset(id)?.is_none()
        {
            errors.add("asset", INVALID_CHOICE);
            asset_id = None;
        }

        errors.finish(|| {
            Some(NewVulnerability {
                name: name?,
                description: description?,
                asset_id: asset_id?,
                severity: severity?,
            })
        })
    }
}
