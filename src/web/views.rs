//! Page bodies, one per route

use axum::response::Html;

use super::pages::{
    self, Choices, date_input, empty_row, escape, hidden, multi_select, number_input,
    password_input, rating_input, score_badge, select, status_badge, text_input, textarea,
};
use crate::auth::CurrentUser;
use crate::auth::handlers::LoginForm;
use crate::domain::{ResponseType, RiskStatus, ThreatType};
use crate::forms::{
    ASSESSMENT_STATUS_MAX, AssetForm, CATEGORY_MAX, FormErrors, ImpactForm, NAME_MAX,
    RiskAssessmentForm, RiskForm, RiskResponseForm, ThreatForm, USERNAME_MAX, VulnerabilityForm,
};
use crate::storage::{
    Assessment, AssessmentSummary, AssetOverview, Risk, RiskResponse, Threat, User, Vulnerability,
};

fn status_choices() -> Choices {
    RiskStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), s.label().to_string()))
        .collect()
}

fn threat_type_choices() -> Choices {
    ThreatType::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), t.label().to_string()))
        .collect()
}

fn response_type_choices() -> Choices {
    ResponseType::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), t.label().to_string()))
        .collect()
}

fn risk_choices(risks: &[Risk]) -> Choices {
    risks
        .iter()
        .map(|r| (r.id.to_string(), format!("{} - {}", r.name, r.asset_name)))
        .collect()
}

fn assessment_rows(assessments: &[Assessment]) -> String {
    if assessments.is_empty() {
        return empty_row(5, "No assessments yet.");
    }
    assessments
        .iter()
        .map(|a| {
            format!(
                r#"<tr>
                <td><a href="/assessment/{id}/">{title}</a></td>
                <td>{status}</td>
                <td>{start} to {end}</td>
                <td>{assessor}</td>
                <td>{risks}</td>
            </tr>"#,
                id = a.id,
                title = escape(&a.title),
                status = escape(&a.status),
                start = a.start_date,
                end = a.end_date,
                assessor = escape(a.assessor_name.as_deref().unwrap_or("Unassigned")),
                risks = a.risk_count,
            )
        })
        .collect()
}

const ASSESSMENT_HEAD: &str =
    "<tr><th>Title</th><th>Status</th><th>Period</th><th>Assessor</th><th>Risks</th></tr>";

const RISK_HEAD: &str = "<tr><th>Risk</th><th>Asset</th><th>Threat</th><th>Likelihood</th><th>Impact</th><th>Score</th><th>Status</th><th></th></tr>";

fn risk_rows(risks: &[Risk], threshold: f64) -> String {
    if risks.is_empty() {
        return empty_row(8, "No risks recorded.");
    }
    risks
        .iter()
        .map(|r| {
            format!(
                r#"<tr>
                <td>{name}</td>
                <td>{asset}</td>
                <td>{threat}</td>
                <td>{likelihood}</td>
                <td>{impact}</td>
                <td>{score}</td>
                <td>{status}</td>
                <td class="actions">
                    <a href="/risks/{id}/response/">Respond</a>
                    <a href="/risks/impact/{id}/">Impact</a>
                </td>
            </tr>"#,
                name = escape(&r.name),
                asset = escape(&r.asset_name),
                threat = escape(&r.threat_name),
                likelihood = r.likelihood,
                impact = r.impact,
                score = score_badge(r.risk_score, threshold),
                status = status_badge(r.status),
                id = r.id,
            )
        })
        .collect()
}

fn table(head: &str, rows: &str) -> String {
    format!(
        r#"<table class="table"><thead>{}</thead><tbody>{}</tbody></table>"#,
        head, rows
    )
}

pub fn dashboard(
    user: &CurrentUser,
    assessments: &[Assessment],
    high_risks: &[Risk],
    recent: &[Assessment],
    threshold: f64,
) -> Html<String> {
    let content = format!(
        r#"<section class="grid">
        <div class="card">
            <h2>High risks</h2>
            <p class="muted">Top 5 risks scoring {threshold:.1} or more</p>
            {high}
        </div>
        <div class="card">
            <h2>Recent assessments</h2>
            {recent}
        </div>
    </section>
    <section class="card">
        <h2>All assessments</h2>
        <p><a class="button" href="/planning/">Plan an assessment</a></p>
        {all}
    </section>"#,
        threshold = threshold,
        high = table(RISK_HEAD, &risk_rows(high_risks, threshold)),
        recent = table(ASSESSMENT_HEAD, &assessment_rows(recent)),
        all = table(ASSESSMENT_HEAD, &assessment_rows(assessments)),
    );
    pages::layout("Dashboard", Some(user), &content)
}

pub fn planning(
    user: &CurrentUser,
    form: &RiskAssessmentForm,
    errors: &FormErrors,
    users: &[User],
    risks: &[Risk],
) -> Html<String> {
    let assessors: Choices = users
        .iter()
        .map(|u| (u.id.to_string(), u.username.clone()))
        .collect();
    let fields = [
        text_input("title", "Title", &form.title, Some(NAME_MAX), errors),
        textarea("description", "Description", &form.description, 4, errors),
        date_input("start_date", "Start date", &form.start_date, errors),
        date_input("end_date", "End date", &form.end_date, errors),
        text_input(
            "status",
            "Status",
            &form.status,
            Some(ASSESSMENT_STATUS_MAX),
            errors,
        ),
        select("assessor", "Assessor", &assessors, &form.assessor, true, errors),
        multi_select(
            "risks",
            "Risks",
            &risk_choices(risks),
            |v| v.parse::<i64>().is_ok_and(|id| form.selects_risk(id)),
            errors,
        ),
    ];
    let content = pages::form("/planning/", errors, &fields, "Create assessment");
    pages::layout("Plan a risk assessment", Some(user), &content)
}

pub fn assets(user: &CurrentUser, assets: &[AssetOverview]) -> Html<String> {
    let rows = if assets.is_empty() {
        empty_row(5, "No assets recorded.")
    } else {
        assets
            .iter()
            .map(|a| {
                format!(
                    r#"<tr>
                <td>{name}</td>
                <td>{category}</td>
                <td class="num">{value}</td>
                <td>{description}</td>
                <td class="num">{vulns}</td>
            </tr>"#,
                    name = escape(&a.asset.name),
                    category = escape(&a.asset.category),
                    value = a.asset.value,
                    description = escape(&a.asset.description),
                    vulns = a.vulnerability_count,
                )
            })
            .collect()
    };
    let content = format!(
        r#"<p>
        <a class="button" href="/assets/new/">Add asset</a>
        <a class="button" href="/vulnerabilities/">Record vulnerability</a>
    </p>
    {}"#,
        table(
            "<tr><th>Name</th><th>Category</th><th>Value</th><th>Description</th><th>Vulnerabilities</th></tr>",
            &rows
        )
    );
    pages::layout("Assets", Some(user), &content)
}

pub fn asset_form(user: &CurrentUser, form: &AssetForm, errors: &FormErrors) -> Html<String> {
    let fields = [
        text_input("name", "Name", &form.name, Some(NAME_MAX), errors),
        textarea("description", "Description", &form.description, 3, errors),
        number_input(
            "value",
            "Value",
            &form.value,
            (Some(0), None),
            "0.01",
            None,
            errors,
        ),
        text_input("category", "Category", &form.category, Some(CATEGORY_MAX), errors),
    ];
    let content = pages::form("/assets/new/", errors, &fields, "Save asset");
    pages::layout("Add asset", Some(user), &content)
}

pub fn vulnerability_form(
    user: &CurrentUser,
    form: &VulnerabilityForm,
    errors: &FormErrors,
    assets: &[AssetOverview],
) -> Html<String> {
    let asset_choices: Choices = assets
        .iter()
        .map(|a| (a.asset.id.to_string(), a.asset.name.clone()))
        .collect();
    let fields = [
        text_input("name", "Name", &form.name, Some(NAME_MAX), errors),
        textarea("description", "Description", &form.description, 3, errors),
        select("asset", "Asset", &asset_choices, &form.asset, true, errors),
        rating_input("severity", "Severity", &form.severity, errors),
    ];
    let content = pages::form("/vulnerabilities/", errors, &fields, "Save vulnerability");
    pages::layout("Vulnerability analysis", Some(user), &content)
}

pub fn threat_form(user: &CurrentUser, form: &ThreatForm, errors: &FormErrors) -> Html<String> {
    let fields = [
        text_input("name", "Name", &form.name, Some(NAME_MAX), errors),
        textarea("description", "Description", &form.description, 3, errors),
        select(
            "threat_type",
            "Threat type",
            &threat_type_choices(),
            &form.threat_type,
            true,
            errors,
        ),
        rating_input("likelihood", "Likelihood", &form.likelihood, errors),
    ];
    let content = pages::form("/threats/", errors, &fields, "Save threat");
    pages::layout("Threat analysis", Some(user), &content)
}

pub fn risk_form(
    user: &CurrentUser,
    form: &RiskForm,
    errors: &FormErrors,
    assets: &[AssetOverview],
    vulnerabilities: &[Vulnerability],
    threats: &[Threat],
) -> Html<String> {
    let asset_choices: Choices = assets
        .iter()
        .map(|a| (a.asset.id.to_string(), a.asset.name.clone()))
        .collect();
    let vulnerability_choices: Choices = vulnerabilities
        .iter()
        .map(|v| (v.id.to_string(), format!("{} - {}", v.name, v.asset_name)))
        .collect();
    let threat_choices: Choices = threats
        .iter()
        .map(|t| (t.id.to_string(), t.name.clone()))
        .collect();

    let fields = [
        text_input("name", "Name", &form.name, Some(NAME_MAX), errors),
        textarea("description", "Description", &form.description, 3, errors),
        select("asset", "Asset", &asset_choices, &form.asset, true, errors),
        select(
            "vulnerability",
            "Vulnerability",
            &vulnerability_choices,
            &form.vulnerability,
            true,
            errors,
        ),
        select("threat", "Threat", &threat_choices, &form.threat, true, errors),
        rating_input("likelihood", "Likelihood", &form.likelihood, errors),
        rating_input("impact", "Impact", &form.impact, errors),
        select("status", "Status", &status_choices(), &form.status, false, errors),
        textarea(
            "mitigation_plan",
            "Mitigation plan",
            &form.mitigation_plan,
            4,
            errors,
        ),
    ];
    let content = format!(
        r#"<p class="muted">Risk score = likelihood &times; impact / 2</p>
    {}"#,
        pages::form("/risks/calculate/", errors, &fields, "Calculate and save")
    );
    pages::layout("Risk calculation", Some(user), &content)
}

pub fn prioritize(user: &CurrentUser, risks: &[Risk], threshold: f64) -> Html<String> {
    let content = table(RISK_HEAD, &risk_rows(risks, threshold));
    pages::layout("Risk prioritization", Some(user), &content)
}

fn risk_summary(risk: &Risk, threshold: f64) -> String {
    format!(
        r#"<dl class="summary">
        <dt>Asset</dt><dd>{asset}</dd>
        <dt>Vulnerability</dt><dd>{vulnerability}</dd>
        <dt>Threat</dt><dd>{threat}</dd>
        <dt>Likelihood</dt><dd>{likelihood}</dd>
        <dt>Impact</dt><dd>{impact}</dd>
        <dt>Score</dt><dd>{score}</dd>
        <dt>Status</dt><dd>{status}</dd>
    </dl>"#,
        asset = escape(&risk.asset_name),
        vulnerability = escape(&risk.vulnerability_name),
        threat = escape(&risk.threat_name),
        likelihood = risk.likelihood,
        impact = risk.impact,
        score = score_badge(risk.risk_score, threshold),
        status = status_badge(risk.status),
    )
}

pub fn response(
    user: &CurrentUser,
    risk: &Risk,
    recorded: Option<&RiskResponse>,
    form: &RiskResponseForm,
    errors: &FormErrors,
    threshold: f64,
) -> Html<String> {
    let fields = [
        select("status", "Status", &status_choices(), &form.status, false, errors),
        textarea(
            "mitigation_plan",
            "Mitigation plan",
            &form.mitigation_plan,
            4,
            errors,
        ),
        select(
            "response_type",
            "Response type",
            &response_type_choices(),
            &form.response_type,
            true,
            errors,
        ),
        textarea(
            "response_details",
            "Response details",
            &form.response_details,
            3,
            errors,
        ),
    ];
    let last = recorded
        .map(|r| {
            format!(
                r#"<p class="muted">Recorded response: {} (updated {})</p>"#,
                r.response_type.label(),
                escape(&r.updated_at)
            )
        })
        .unwrap_or_default();
    let content = format!(
        "{}{}{}",
        risk_summary(risk, threshold),
        last,
        pages::form(
            &format!("/risks/{}/response/", risk.id),
            errors,
            &fields,
            "Save response"
        )
    );
    pages::layout(&format!("Respond to {}", risk.name), Some(user), &content)
}

pub fn monitor(
    user: &CurrentUser,
    mitigated: &[Risk],
    pending: &[Risk],
    threshold: f64,
) -> Html<String> {
    let content = format!(
        r#"<p class="muted">{total} risks: {m} mitigated, {p} pending</p>
    <section class="card">
        <h2>Pending</h2>
        {pending}
    </section>
    <section class="card">
        <h2>Mitigated</h2>
        {mitigated}
    </section>"#,
        total = mitigated.len() + pending.len(),
        m = mitigated.len(),
        p = pending.len(),
        pending = table(RISK_HEAD, &risk_rows(pending, threshold)),
        mitigated = table(RISK_HEAD, &risk_rows(mitigated, threshold)),
    );
    pages::layout("Risk monitoring", Some(user), &content)
}

pub fn impact(
    user: &CurrentUser,
    risk: &Risk,
    form: &ImpactForm,
    errors: &FormErrors,
    threshold: f64,
) -> Html<String> {
    let fields = [rating_input("impact", "Impact", &form.impact, errors)];
    let content = format!(
        r#"{summary}
    <p class="muted">{likelihood} &times; {impact} / 2 = {score}</p>
    {form}"#,
        summary = risk_summary(risk, threshold),
        likelihood = risk.likelihood,
        impact = risk.impact,
        score = risk
            .risk_score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "n/a".to_string()),
        form = pages::form(
            &format!("/risks/impact/{}/", risk.id),
            errors,
            &fields,
            "Update impact"
        ),
    );
    pages::layout(&format!("Impact analysis: {}", risk.name), Some(user), &content)
}

pub fn assessment_detail(
    user: &CurrentUser,
    assessment: &Assessment,
    risks: &[Risk],
    summary: &AssessmentSummary,
    threshold: f64,
) -> Html<String> {
    let by_status: String = summary
        .by_status
        .iter()
        .map(|c| format!("<tr><td>{}</td><td class=\"num\">{}</td></tr>", status_badge(c.status), c.count))
        .collect();
    let by_impact: String = if summary.by_impact.is_empty() {
        empty_row(2, "No linked risks.")
    } else {
        summary
            .by_impact
            .iter()
            .map(|c| format!("<tr><td>{}</td><td class=\"num\">{}</td></tr>", c.impact, c.count))
            .collect()
    };

    let content = format!(
        r#"<dl class="summary">
        <dt>Status</dt><dd>{status}</dd>
        <dt>Period</dt><dd>{start} to {end}</dd>
        <dt>Assessor</dt><dd>{assessor}</dd>
        <dt>Description</dt><dd>{description}</dd>
    </dl>
    <section class="grid">
        <div class="card">
            <h2>By status</h2>
            {by_status}
        </div>
        <div class="card">
            <h2>By impact</h2>
            {by_impact}
        </div>
    </section>
    <section class="card">
        <h2>Risks ({total})</h2>
        {risks}
    </section>"#,
        status = escape(&assessment.status),
        start = assessment.start_date,
        end = assessment.end_date,
        assessor = escape(assessment.assessor_name.as_deref().unwrap_or("Unassigned")),
        description = escape(&assessment.description),
        by_status = table("<tr><th>Status</th><th>Risks</th></tr>", &by_status),
        by_impact = table("<tr><th>Impact</th><th>Risks</th></tr>", &by_impact),
        total = summary.total_risks,
        risks = table(RISK_HEAD, &risk_rows(risks, threshold)),
    );
    pages::layout(&assessment.title, Some(user), &content)
}

pub fn login(form: &LoginForm, errors: &FormErrors) -> Html<String> {
    let fields = [
        text_input("username", "Username", &form.username, Some(USERNAME_MAX), errors),
        password_input("password", "Password", errors),
        hidden("next", &form.next),
    ];
    let content = pages::form(crate::auth::LOGIN_PATH, errors, &fields, "Log in");
    pages::layout("Log in", None, &content)
}
