//! Authentication middleware for protecting routes

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use tracing::debug;

use super::LOGIN_PATH;
use super::session::{AuthSession, SESSION_COOKIE_NAME};

/// The logged-in user, available to handlers behind [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// Read a live session from the cookie jar
pub fn current_session(cookie_jar: &PrivateCookieJar) -> Option<AuthSession> {
    let cookie = cookie_jar.get(SESSION_COOKIE_NAME)?;
    let session: AuthSession = serde_json::from_str(cookie.value()).ok()?;
    if session.is_expired() {
        debug!(user_id = session.user_id, "Session cookie expired");
        return None;
    }
    Some(session)
}

/// Middleware that requires a session for protected routes.
///
/// Without one, API requests get 401 JSON and browsers are redirected to the
/// login page with the original path in `next`.
pub async fn require_auth(
    cookie_jar: PrivateCookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(session) = current_session(&cookie_jar) {
        debug!(user_id = session.user_id, "Authenticated via session cookie");
        request.extensions_mut().insert(CurrentUser {
            id: session.user_id,
            username: session.username,
        });
        return next.run(request).await;
    }

    let path = request.uri().path();

    if path.starts_with("/api/") {
        (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({
                "error": "Authentication required",
                "login_url": LOGIN_PATH
            })),
        )
            .into_response()
    } else {
        let target = match request.uri().query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        };
        Redirect::to(&format!("{}?next={}", LOGIN_PATH, urlencoding::encode(&target)))
            .into_response()
    }
}
