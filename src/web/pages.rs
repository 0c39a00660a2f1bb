//! HTML layout and form widgets

use axum::response::Html;

use crate::auth::{CurrentUser, LOGOUT_PATH};
use crate::forms::FormErrors;

/// Escape text for use in HTML content and quoted attributes
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

const NAV_LINKS: [(&str, &str); 8] = [
    ("/", "Dashboard"),
    ("/planning/", "Planning"),
    ("/assets/", "Assets"),
    ("/vulnerabilities/", "Vulnerabilities"),
    ("/threats/", "Threats"),
    ("/risks/calculate/", "New risk"),
    ("/risks/prioritize/", "Prioritize"),
    ("/risks/monitor/", "Monitor"),
];

fn nav(user: Option<&CurrentUser>) -> String {
    let Some(user) = user else {
        return String::new();
    };
    let links: String = NAV_LINKS
        .iter()
        .map(|(href, label)| format!(r#"<a href="{}">{}</a>"#, href, label))
        .collect();
    format!(
        r#"<nav class="nav">
        <span class="brand">Risk Register</span>
        {links}
        <form method="post" action="{logout}" class="logout">
            <span class="user">{user}</span>
            <button type="submit">Log out</button>
        </form>
    </nav>"#,
        links = links,
        logout = LOGOUT_PATH,
        user = escape(&user.username),
    )
}

/// Full page with navigation for a logged-in user
pub fn layout(title: &str, user: Option<&CurrentUser>, content: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Risk Register</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    {nav}
    <main class="container">
        <h1>{title}</h1>
        {content}
    </main>
</body>
</html>"#,
        title = escape(title),
        nav = nav(user),
        content = content,
    ))
}

/// Standalone page for 404/500 responses
pub fn error_page(title: &str, message: &str) -> Html<String> {
    layout(
        title,
        None,
        &format!(
            r#"<p class="muted">{}</p>
        <p><a class="button" href="/">Back to dashboard</a></p>"#,
            escape(message)
        ),
    )
}

fn error_list(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", escape(m)))
        .collect();
    format!(r#"<ul class="errorlist">{}</ul>"#, items)
}

/// Messages that belong to the form as a whole
pub fn non_field_errors(errors: &FormErrors) -> String {
    error_list(errors.non_field())
}

fn field(name: &str, label: &str, widget: &str, help: Option<&str>, errors: &FormErrors) -> String {
    let class = if errors.has_field(name) {
        "field has-error"
    } else {
        "field"
    };
    let help = help
        .map(|h| format!(r#"<small class="help">{}</small>"#, escape(h)))
        .unwrap_or_default();
    format!(
        r#"<div class="{class}">
            <label for="id_{name}">{label}</label>
            {widget}
            {help}
            {errors}
        </div>"#,
        class = class,
        name = name,
        label = escape(label),
        widget = widget,
        help = help,
        errors = error_list(errors.field(name)),
    )
}

pub fn text_input(
    name: &str,
    label: &str,
    value: &str,
    max_length: Option<usize>,
    errors: &FormErrors,
) -> String {
    let max = max_length
        .map(|m| format!(r#" maxlength="{}""#, m))
        .unwrap_or_default();
    let widget = format!(
        r#"<input type="text" id="id_{name}" name="{name}" value="{value}"{max}>"#,
        name = name,
        value = escape(value),
        max = max,
    );
    field(name, label, &widget, None, errors)
}

pub fn password_input(name: &str, label: &str, errors: &FormErrors) -> String {
    let widget = format!(
        r#"<input type="password" id="id_{name}" name="{name}" autocomplete="current-password">"#,
        name = name,
    );
    field(name, label, &widget, None, errors)
}

pub fn textarea(name: &str, label: &str, value: &str, rows: u8, errors: &FormErrors) -> String {
    let widget = format!(
        r#"<textarea id="id_{name}" name="{name}" rows="{rows}">{value}</textarea>"#,
        name = name,
        rows = rows,
        value = escape(value),
    );
    field(name, label, &widget, None, errors)
}

/// Numeric input; `bounds` sets min and max, `step` the increment
pub fn number_input(
    name: &str,
    label: &str,
    value: &str,
    bounds: (Option<i64>, Option<i64>),
    step: &str,
    help: Option<&str>,
    errors: &FormErrors,
) -> String {
    let min = bounds
        .0
        .map(|m| format!(r#" min="{}""#, m))
        .unwrap_or_default();
    let max = bounds
        .1
        .map(|m| format!(r#" max="{}""#, m))
        .unwrap_or_default();
    let widget = format!(
        r#"<input type="number" id="id_{name}" name="{name}" value="{value}" step="{step}"{min}{max}>"#,
        name = name,
        value = escape(value),
        step = step,
        min = min,
        max = max,
    );
    field(name, label, &widget, help, errors)
}

/// 1–10 rating input
pub fn rating_input(name: &str, label: &str, value: &str, errors: &FormErrors) -> String {
    number_input(
        name,
        label,
        value,
        (Some(crate::domain::SCORE_MIN), Some(crate::domain::SCORE_MAX)),
        "1",
        Some("Rate from 1 (lowest) to 10 (highest)"),
        errors,
    )
}

pub fn date_input(name: &str, label: &str, value: &str, errors: &FormErrors) -> String {
    let widget = format!(
        r#"<input type="date" id="id_{name}" name="{name}" value="{value}">"#,
        name = name,
        value = escape(value),
    );
    field(name, label, &widget, None, errors)
}

/// Value/label pairs for a select box
pub type Choices = Vec<(String, String)>;

fn options(choices: &Choices, is_selected: impl Fn(&str) -> bool) -> String {
    choices
        .iter()
        .map(|(value, label)| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                escape(value),
                if is_selected(value) { " selected" } else { "" },
                escape(label)
            )
        })
        .collect()
}

/// Single-choice select; `blank` adds an empty first option
pub fn select(
    name: &str,
    label: &str,
    choices: &Choices,
    selected: &str,
    blank: bool,
    errors: &FormErrors,
) -> String {
    let selected = selected.trim();
    let blank = if blank {
        r#"<option value="">---------</option>"#
    } else {
        ""
    };
    let widget = format!(
        r#"<select id="id_{name}" name="{name}">{blank}{options}</select>"#,
        name = name,
        blank = blank,
        options = options(choices, |v| v == selected),
    );
    field(name, label, &widget, None, errors)
}

pub fn multi_select(
    name: &str,
    label: &str,
    choices: &Choices,
    is_selected: impl Fn(&str) -> bool,
    errors: &FormErrors,
) -> String {
    let widget = format!(
        r#"<select id="id_{name}" name="{name}" multiple size="8">{options}</select>"#,
        name = name,
        options = options(choices, is_selected),
    );
    field(
        name,
        label,
        &widget,
        Some("Hold Ctrl or Cmd to select more than one."),
        errors,
    )
}

pub fn hidden(name: &str, value: &str) -> String {
    format!(
        r#"<input type="hidden" name="{}" value="{}">"#,
        name,
        escape(value)
    )
}

/// POST form wrapping the given fields
pub fn form(action: &str, errors: &FormErrors, fields: &[String], submit: &str) -> String {
    format!(
        r#"<form method="post" action="{action}" class="form" novalidate>
        {non_field}
        {fields}
        <button type="submit" class="button primary">{submit}</button>
    </form>"#,
        action = escape(action),
        non_field = non_field_errors(errors),
        fields = fields.concat(),
        submit = escape(submit),
    )
}

/// Score with a highlight once it reaches `threshold`
pub fn score_badge(score: Option<f64>, threshold: f64) -> String {
    match score {
        Some(s) if s >= threshold => format!(r#"<span class="score high">{:.1}</span>"#, s),
        Some(s) => format!(r#"<span class="score">{:.1}</span>"#, s),
        None => r#"<span class="score muted">n/a</span>"#.to_string(),
    }
}

pub fn status_badge(status: crate::domain::RiskStatus) -> String {
    format!(
        r#"<span class="status status-{}">{}</span>"#,
        status.as_str(),
        status.label()
    )
}

/// Placeholder row for an empty table
pub fn empty_row(columns: usize, message: &str) -> String {
    format!(
        r#"<tr><td colspan="{}" class="muted">{}</td></tr>"#,
        columns,
        escape(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_field_shows_errors_and_value() {
        let mut errors = FormErrors::new();
        errors.add("name", "This field is required.");
        let html = text_input("name", "Name", "<b>", Some(200), &errors);
        assert!(html.contains("has-error"));
        assert!(html.contains(r#"value="&lt;b&gt;""#));
        assert!(html.contains(r#"maxlength="200""#));
        assert!(html.contains("<li>This field is required.</li>"));
    }

    #[test]
    fn test_select_marks_selected() {
        let choices = vec![
            ("1".to_string(), "One".to_string()),
            ("2".to_string(), "Two".to_string()),
        ];
        let html = select("asset", "Asset", &choices, "2", true, &FormErrors::new());
        assert!(html.contains(r#"<option value="2" selected>Two</option>"#));
        assert!(html.contains(r#"<option value="1">One</option>"#));
        assert!(html.contains("---------"));
    }

    #[test]
    fn test_layout_without_user_has_no_nav() {
        let Html(page) = layout("Login", None, "<p>x</p>");
        assert!(!page.contains("Log out"));

        let user = CurrentUser {
            id: 1,
            username: "alice".to_string(),
        };
        let Html(page) = layout("Dashboard", Some(&user), "");
        assert!(page.contains("Log out"));
        assert!(page.contains("alice"));
    }

    #[test]
    fn test_score_badge() {
        assert!(score_badge(Some(20.0), 7.0).contains("high"));
        assert!(score_badge(Some(4.5), 7.0).contains(">4.5<"));
        assert!(score_badge(None, 7.0).contains("n/a"));
    }
}
