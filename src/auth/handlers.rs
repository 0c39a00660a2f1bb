//! Authentication HTTP handlers

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar};
use cookie::Cookie;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::middleware::current_session;
use super::password::{DUMMY_HASH, verify_password};
use super::session::{AuthSession, SESSION_COOKIE_NAME};
use super::{LOGIN_PATH, safe_next};
use crate::forms::{FormErrors, REQUIRED};
use crate::web::{AppError, AppState, views};

pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub username: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub password: String,
    #[serde(deserialize_with = "crate::forms::last_value")]
    pub next: String,
}

/// GET /accounts/login/ - Show the login form
pub async fn login_page(
    cookie_jar: PrivateCookieJar,
    Query(query): Query<LoginQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref()).to_string();

    if current_session(&cookie_jar).is_some() {
        return Redirect::to(&next).into_response();
    }

    let form = LoginForm {
        next,
        ..LoginForm::default()
    };
    views::login(&form, &FormErrors::new()).into_response()
}

/// POST /accounts/login/ - Check credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    cookie_jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut errors = FormErrors::new();
    let username = form.username.trim();
    if username.is_empty() {
        errors.add("username", REQUIRED);
    }
    if form.password.is_empty() {
        errors.add("password", REQUIRED);
    }
    if !errors.is_empty() {
        return Ok(views::login(&form, &errors).into_response());
    }

    // Unknown usernames are checked against a dummy hash to keep timing even
    let credentials = state.db.find_credentials(username)?;
    let password = form.password.clone();
    let hash = credentials
        .as_ref()
        .map_or_else(|| DUMMY_HASH.to_string(), |c| c.password_hash.clone());
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Password verification task failed");
            false
        });
    let user = credentials.filter(|_| valid).map(|c| c.user);

    let Some(user) = user else {
        warn!(username = %username, "Login failed");
        errors.add_non_field(INVALID_LOGIN);
        let form = LoginForm {
            password: String::new(),
            ..form
        };
        return Ok(views::login(&form, &errors).into_response());
    };

    let session = AuthSession::new(user.id, &user.username, state.settings.session_ttl_hours);
    let session_json = serde_json::to_string(&session).map_err(anyhow::Error::from)?;
    let session_cookie = Cookie::build((SESSION_COOKIE_NAME, session_json))
        .path("/")
        .http_only(true)
        .same_site(cookie::SameSite::Lax)
        .max_age(cookie::time::Duration::hours(i64::from(
            state.settings.session_ttl_hours,
        )))
        .build();

    let target = safe_next(Some(form.next.as_str()));
    info!(
        user_id = user.id,
        username = %user.username,
        "Login successful, redirecting to {}",
        target
    );

    Ok((cookie_jar.add(session_cookie), Redirect::to(target)).into_response())
}

/// GET|POST /accounts/logout/ - Clear session and redirect to login
pub async fn logout(cookie_jar: PrivateCookieJar) -> impl IntoResponse {
    if let Some(session) = current_session(&cookie_jar) {
        info!(user_id = session.user_id, "User logged out");
    }

    let remove_session = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(cookie::time::Duration::ZERO)
        .build();

    (cookie_jar.add(remove_session), Redirect::to(LOGIN_PATH))
}
