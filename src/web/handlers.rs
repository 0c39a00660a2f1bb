//! HTTP request handlers for the HTML pages
//!
//! GET renders the page; POST validates the submitted form and either
//! redirects (303) or renders the page again with the errors.

use axum::{
    Extension,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use tracing::info;

use super::error::AppError;
use super::state::AppState;
use super::views;
use crate::auth::CurrentUser;
use crate::domain::RiskStatus;
use crate::forms::{
    AssetForm, FormError, FormErrors, ImpactForm, RiskAssessmentForm, RiskForm, RiskResponseForm,
    ThreatForm, VulnerabilityForm,
};
use crate::storage::Risk;

/// High risks shown on the dashboard
const HIGH_RISK_LIMIT: usize = 5;
/// Recent assessments shown on the dashboard
const RECENT_ASSESSMENTS: usize = 5;

type PageResult = Result<Response, AppError>;

/// Route IDs that are not integers are treated like unknown records
fn parse_id(raw: &str, what: &'static str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::NotFound(what))
}

fn load_risk(state: &AppState, raw_id: &str) -> Result<Risk, AppError> {
    let id = parse_id(raw_id, "Risk")?;
    state.db.get_risk(id)?.ok_or(AppError::NotFound("Risk"))
}

/// Split a form outcome into the draft, or the errors to render
fn invalid<T>(result: Result<T, FormError>) -> Result<Result<T, FormErrors>, AppError> {
    match result {
        Ok(draft) => Ok(Ok(draft)),
        Err(FormError::Invalid(errors)) => Ok(Err(errors)),
        Err(FormError::Storage(e)) => Err(e.into()),
    }
}

// ============================================
// Dashboard
// ============================================

/// GET /
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    let threshold = state.settings.high_risk_threshold;
    let assessments = state.db.list_assessments(None)?;
    let high_risks = state.db.list_high_risks(threshold, HIGH_RISK_LIMIT)?;
    let recent = state.db.list_assessments(Some(RECENT_ASSESSMENTS))?;

    Ok(views::dashboard(
        &user,
        &assessments,
        &high_risks,
        &recent,
        threshold,
    ))
}

// ============================================
// Planning
// ============================================

fn render_planning(
    state: &AppState,
    user: &CurrentUser,
    form: &RiskAssessmentForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let users = state.db.list_users()?;
    let risks = state.db.list_risks_by_score(None)?;
    Ok(views::planning(user, form, errors, &users, &risks))
}

/// GET /planning/
pub async fn planning_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    let form = RiskAssessmentForm {
        assessor: user.id.to_string(),
        ..RiskAssessmentForm::default()
    };
    render_planning(&state, &user, &form, &FormErrors::new())
}

/// POST /planning/
pub async fn create_assessment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<RiskAssessmentForm>,
) -> PageResult {
    match invalid(form.validate(&state.db))? {
        Ok(draft) => {
            let assessment = state.db.create_assessment(&draft)?;
            info!(
                assessment_id = assessment.id,
                risks = assessment.risk_count,
                user = %user.username,
                "Risk assessment created"
            );
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => Ok(render_planning(&state, &user, &form, &errors)?.into_response()),
    }
}

// ============================================
// Assets and vulnerabilities
// ============================================

/// GET /assets/
pub async fn list_assets(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    let assets = state.db.list_assets()?;
    Ok(views::assets(&user, &assets))
}

/// GET /assets/new/
pub async fn asset_page(Extension(user): Extension<CurrentUser>) -> Html<String> {
    views::asset_form(&user, &AssetForm::default(), &FormErrors::new())
}

/// POST /assets/new/
pub async fn create_asset(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<AssetForm>,
) -> PageResult {
    match invalid(form.validate())? {
        Ok(draft) => {
            let asset = state.db.create_asset(&draft)?;
            info!(asset_id = asset.id, user = %user.username, "Asset created");
            Ok(Redirect::to("/assets/").into_response())
        }
        Err(errors) => Ok(views::asset_form(&user, &form, &errors).into_response()),
    }
}

fn render_vulnerability(
    state: &AppState,
    user: &CurrentUser,
    form: &VulnerabilityForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let assets = state.db.list_assets()?;
    Ok(views::vulnerability_form(user, form, errors, &assets))
}

/// GET /vulnerabilities/
pub async fn vulnerability_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    render_vulnerability(&state, &user, &VulnerabilityForm::default(), &FormErrors::new())
}

/// POST /vulnerabilities/
pub async fn create_vulnerability(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<VulnerabilityForm>,
) -> PageResult {
    match invalid(form.validate(&state.db))? {
        Ok(draft) => {
            let vulnerability = state.db.create_vulnerability(&draft)?;
            info!(
                vulnerability_id = vulnerability.id,
                asset_id = vulnerability.asset_id,
                user = %user.username,
                "Vulnerability created"
            );
            Ok(Redirect::to("/assets/").into_response())
        }
        Err(errors) => Ok(render_vulnerability(&state, &user, &form, &errors)?.into_response()),
    }
}

// ============================================
// Threats
// ============================================

/// GET /threats/
pub async fn threat_page(Extension(user): Extension<CurrentUser>) -> Html<String> {
    views::threat_form(&user, &ThreatForm::default(), &FormErrors::new())
}

/// POST /threats/
pub async fn create_threat(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<ThreatForm>,
) -> PageResult {
    match invalid(form.validate())? {
        Ok(draft) => {
            let threat = state.db.create_threat(&draft)?;
            info!(threat_id = threat.id, user = %user.username, "Threat created");
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => Ok(views::threat_form(&user, &form, &errors).into_response()),
    }
}

// ============================================
// Risks
// ============================================

fn render_risk(
    state: &AppState,
    user: &CurrentUser,
    form: &RiskForm,
    errors: &FormErrors,
) -> Result<Html<String>, AppError> {
    let assets = state.db.list_assets()?;
    let vulnerabilities = state.db.list_vulnerabilities()?;
    let threats = state.db.list_threats()?;
    Ok(views::risk_form(
        user,
        form,
        errors,
        &assets,
        &vulnerabilities,
        &threats,
    ))
}

/// GET /risks/calculate/
pub async fn risk_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    render_risk(&state, &user, &RiskForm::blank(), &FormErrors::new())
}

/// POST /risks/calculate/
pub async fn create_risk(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<RiskForm>,
) -> PageResult {
    match invalid(form.validate(&state.db))? {
        Ok(draft) => {
            let risk = state.db.create_risk(&draft)?;
            info!(
                risk_id = risk.id,
                risk_score = ?risk.risk_score,
                user = %user.username,
                "Risk created"
            );
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => Ok(render_risk(&state, &user, &form, &errors)?.into_response()),
    }
}

/// GET /risks/prioritize/
pub async fn prioritize(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    let risks = state.db.list_risks_by_score(None)?;
    Ok(views::prioritize(
        &user,
        &risks,
        state.settings.high_risk_threshold,
    ))
}

/// GET /risks/monitor/
pub async fn monitor(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    let (mitigated, pending): (Vec<Risk>, Vec<Risk>) = state
        .db
        .list_risks_by_score(None)?
        .into_iter()
        .partition(|r| r.status == RiskStatus::Mitigated);
    Ok(views::monitor(
        &user,
        &mitigated,
        &pending,
        state.settings.high_risk_threshold,
    ))
}

/// GET /risks/{id}/response/
pub async fn response_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let risk = load_risk(&state, &id)?;
    let recorded = state.db.get_risk_response(risk.id)?;
    let form = RiskResponseForm::for_risk(&risk, recorded.as_ref());
    Ok(views::response(
        &user,
        &risk,
        recorded.as_ref(),
        &form,
        &FormErrors::new(),
        state.settings.high_risk_threshold,
    ))
}

/// POST /risks/{id}/response/
pub async fn update_response(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Form(form): Form<RiskResponseForm>,
) -> PageResult {
    let risk = load_risk(&state, &id)?;

    match invalid(form.validate())? {
        Ok(update) => {
            if !state.db.update_risk_response(risk.id, &update)? {
                return Err(AppError::NotFound("Risk"));
            }
            info!(
                risk_id = risk.id,
                status = %update.status,
                user = %user.username,
                "Risk response recorded"
            );
            Ok(Redirect::to("/").into_response())
        }
        Err(errors) => {
            let recorded = state.db.get_risk_response(risk.id)?;
            Ok(views::response(
                &user,
                &risk,
                recorded.as_ref(),
                &form,
                &errors,
                state.settings.high_risk_threshold,
            )
            .into_response())
        }
    }
}

/// GET /risks/impact/{id}/
pub async fn impact_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let risk = load_risk(&state, &id)?;
    let form = ImpactForm {
        impact: risk.impact.to_string(),
    };
    Ok(views::impact(
        &user,
        &risk,
        &form,
        &FormErrors::new(),
        state.settings.high_risk_threshold,
    ))
}

/// POST /risks/impact/{id}/
pub async fn update_impact(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Form(form): Form<ImpactForm>,
) -> PageResult {
    let risk = load_risk(&state, &id)?;

    match invalid(form.validate())? {
        Ok(impact) => {
            if !state.db.update_risk_impact(risk.id, impact)? {
                return Err(AppError::NotFound("Risk"));
            }
            info!(
                risk_id = risk.id,
                old_impact = risk.impact,
                new_impact = impact,
                user = %user.username,
                "Risk impact updated"
            );
            Ok(Redirect::to(&format!("/risks/impact/{}/", risk.id)).into_response())
        }
        Err(errors) => Ok(views::impact(
            &user,
            &risk,
            &form,
            &errors,
            state.settings.high_risk_threshold,
        )
        .into_response()),
    }
}

// ============================================
// Assessment detail
// ============================================

/// GET /assessment/{id}/
pub async fn assessment_detail(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id = parse_id(&id, "Assessment")?;
    let assessment = state
        .db
        .get_assessment(id)?
        .ok_or(AppError::NotFound("Assessment"))?;
    let summary = state
        .db
        .assessment_summary(id)?
        .ok_or(AppError::NotFound("Assessment"))?;
    let risks = state.db.assessment_risks(id)?;

    Ok(views::assessment_detail(
        &user,
        &assessment,
        &risks,
        &summary,
        state.settings.high_risk_threshold,
    ))
}
