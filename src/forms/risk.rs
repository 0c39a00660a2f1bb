//! Risk and impact forms

use serde::Deserialize;

use super::{
    FormError, FormErrors, INVALID_CHOICE, NAME_MAX, choice, optional_text, rating, reference_id,
    required_text,
};
use crate::domain::RiskStatus;
use crate::storage::{Database, NewRisk};

pub const PLAN_REQUIRED: &str = "A mitigation plan is required when status is set to 'mitigated'.";
pub const VULNERABILITY_ASSET_MISMATCH: &str =
    "The selected vulnerability must be associated with the selected asset.";

/// Trimmed mitigation plan; blank is only allowed while the risk is not mitigated
pub(super) fn mitigation_plan(
    errors: &mut FormErrors,
    status: Option<RiskStatus>,
    raw: &str,
) -> Option<String> {
    let plan = optional_text(raw);
    if status == Some(RiskStatus::Mitigated) && plan.is_none() {
        errors.add("mitigation_plan", PLAN_REQUIRED);
    }
    plan
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RiskForm {
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub name: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub description: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub asset: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub vulnerability: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub threat: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub likelihood: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub impact: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub status: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub mitigation_plan: String,
}

impl RiskForm {
    /// Blank form with the default status preselected
    pub fn blank() -> Self {
        Self {
            status: RiskStatus::default().as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self, db: &Database) -> Result<NewRisk, FormError> {
        let mut errors = FormErrors::new();

        let name = required_text(&mut errors, "name", &self.name, Some(NAME_MAX));
        let description = required_text(&mut errors, "description", &self.description, None);
        let likelihood = rating(&mut errors, "likelihood", "Likelihood", &self.likelihood);
        let impact = rating(&mut errors, "impact", "Impact", &self.impact);
        let status = choice::<RiskStatus>(&mut errors, "status", &self.status);
        let plan = mitigation_plan(&mut errors, status, &self.mitigation_plan);

        let mut asset_id = reference_id(&mut errors, "asset", &self.asset);
        if let Some(id) = asset_id
            && db.get_asset(id)?.is_none()
        {
            errors.add("asset", INVALID_CHOICE);
            asset_id = None;
        }

        let mut vulnerability = None;
        if let Some(id) = reference_id(&mut errors, "vulnerability", &self.vulnerability) {
            vulnerability = db.get_vulnerability(id)?;
            if vulnerability.is_none() {
                errors.add("vulnerability", INVALID_CHOICE);
            }
        }

        let mut threat_id = reference_id(&mut errors, "threat", &self.threat);
        if let Some(id) = threat_id
            && db.get_threat(id)?.is_none()
        {
            errors.add("threat", INVALID_CHOICE);
            threat_id = None;
        }

        if let (Some(asset_id), Some(v)) = (asset_id, &vulnerability)
            && v.asset_id != asset_id
        {
            errors.add_non_field(VULNERABILITY_ASSET_MISMATCH);
        }

        errors.finish(|| {
            Some(NewRisk {
                name: name?,
                description: description?,
                asset_id: asset_id?,
                vulnerability_id: vulnerability?.id,
                threat_id: threat_id?,
                likelihood: likelihood?,
                impact: impact?,
                status: status?,
                mitigation_plan: plan,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImpactForm {
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub impact: String,
}

impl ImpactForm {
    pub fn validate(&self) -> Result<i64, FormError> {
        let mut errors = FormErrors::new();
        let impact = rating(&mut errors, "impact", "Impact", &self.impact);
        errors.finish(|| impact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ThreatType;
    use crate::storage::testing::{sample_asset, seed_graph};
    use crate::storage::{NewThreat, NewVulnerability};

    fn risk_form(asset: i64, vulnerability: i64, threat: i64) -> RiskForm {
        RiskForm {
            name: "Data breach".to_string(),
            description: "Customer records exfiltrated".to_string(),
            asset: asset.to_string(),
            vulnerability: vulnerability.to_string(),
            threat: threat.to_string(),
            likelihood: "5".to_string(),
            impact: "8".to_string(),
            ..RiskForm::blank()
        }
    }

    fn errors_of(result: Result<NewRisk, FormError>) -> FormErrors {
        match result {
            Err(FormError::Invalid(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn test_risk_form_valid() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let g = seed_graph(&db);

        let draft = risk_form(g.asset_id, g.vulnerability_id, g.threat_id)
            .validate(&db)
            .expect("valid");
        assert_eq!(draft.status, RiskStatus::Identified);
        assert_eq!(draft.mitigation_plan, None);

        let risk = db.create_risk(&draft).expect("create");
        assert_eq!(risk.risk_score, Some(20.0));
    }

    #[test]
    fn test_risk_form_rejects_foreign_vulnerability() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let g = seed_graph(&db);
        let other = db.create_asset(&sample_asset("Laptop")).expect("asset");
        let foreign = db
            .create_vulnerability(&NewVulnerability {
                name: "Stolen device".to_string(),
                description: "No remote wipe".to_string(),
                asset_id: other.id,
                severity: 5,
            })
            .expect("vulnerability");

        let errors = errors_of(risk_form(g.asset_id, foreign.id, g.threat_id).validate(&db));
        assert_eq!(errors.non_field(), [VULNERABILITY_ASSET_MISMATCH]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_risk_form_unknown_references() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let g = seed_graph(&db);
        let threat = db
            .create_threat(&NewThreat {
                name: "Flood".to_string(),
                description: "River overflow".to_string(),
                threat_type: ThreatType::Natural,
                likelihood: 2,
            })
            .expect("threat");

        let errors = errors_of(risk_form(999, 998, threat.id + 1).validate(&db));
        for field in ["asset", "vulnerability", "threat"] {
            assert_eq!(errors.field(field), [INVALID_CHOICE], "field {}", field);
        }
        assert!(errors.non_field().is_empty());
        // Unknown asset must not also trip the mismatch check
        let errors = errors_of(risk_form(999, g.vulnerability_id, g.threat_id).validate(&db));
        assert!(errors.non_field().is_empty());
    }

    #[test]
    fn test_risk_form_mitigated_needs_plan() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let g = seed_graph(&db);
        let mut form = risk_form(g.asset_id, g.vulnerability_id, g.threat_id);
        form.status = "mitigated".to_string();
        form.mitigation_plan = "   ".to_string();

        assert_eq!(errors_of(form.validate(&db)).field("mitigation_plan"), [PLAN_REQUIRED]);

        form.mitigation_plan = " Apply vendor patch ".to_string();
        let draft = form.validate(&db).expect("valid");
        assert_eq!(draft.mitigation_plan.as_deref(), Some("Apply vendor patch"));
    }

    #[test]
    fn test_risk_form_rating_messages() {
        let db = Database::new(":memory:").expect("Failed to create database");
        let g = seed_graph(&db);
        let mut form = risk_form(g.asset_id, g.vulnerability_id, g.threat_id);
        form.likelihood = "0".to_string();
        form.impact = "12".to_string();

        let errors = errors_of(form.validate(&db));
        assert_eq!(errors.field("likelihood"), ["Likelihood must be between 1 and 10."]);
        assert_eq!(errors.field("impact"), ["Impact must be between 1 and 10."]);
    }

    #[test]
    fn test_impact_form() {
        let form = ImpactForm { impact: "4".to_string() };
        assert_eq!(form.validate().ok(), Some(4));

        let form = ImpactForm { impact: String::new() };
        assert!(matches!(form.validate(), Err(FormError::Invalid(_))));
    }
}
