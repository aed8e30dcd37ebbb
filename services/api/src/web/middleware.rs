//! services/api/src/web/middleware.rs
//!
//! Session-cookie handling and the authentication/authorization middlewares.
//!
//! Three tiers: `load_viewer` resolves an *optional* identity for the learner
//! surface (anonymous browsing is fine there), `require_auth` insists on a
//! signed-in user, and `require_admin` additionally checks the configured
//! allow-list. Admin checks always happen here, server-side - a client hiding
//! its admin buttons is not a security boundary.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::web::state::AppState;
use opencourse_core::domain::User;

pub const SESSION_COOKIE: &str = "session";

/// The optional viewer identity attached to learner-surface requests.
#[derive(Clone, Debug)]
pub struct MaybeViewer(pub Option<User>);

/// Pulls the session id out of the `Cookie` header, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
    })
}

/// Resolves the session cookie to a user, tolerating absence: an invalid or
/// missing cookie simply yields an anonymous viewer.
async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    let session_id = session_id_from_headers(headers)?;
    match state.auth.validate_auth_session(session_id).await {
        Ok(user) => Some(user),
        Err(e) => {
            debug!("Session cookie did not resolve to a user: {:?}", e);
            None
        }
    }
}

/// Middleware for the learner surface: attaches `MaybeViewer` and always
/// continues.
pub async fn load_viewer(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let user = resolve_user(&state, req.headers()).await;
    req.extensions_mut().insert(MaybeViewer(user));
    next.run(req).await
}

/// Middleware that validates the auth session cookie and extracts the user.
///
/// If valid, inserts the `User` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = resolve_user(&state, req.headers())
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Middleware for the authoring surface: a signed-in user whose email is on
/// the configured allow-list. Everyone else gets 403 (401 when anonymous).
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = resolve_user(&state, req.headers())
        .await
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !state.config.is_admin(&user.email) {
        debug!(email = %user.email, "Rejected non-admin on the authoring surface");
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn finds_the_session_cookie_among_others() {
        let headers = headers_with_cookie("theme=dark; session=abc123; lang=es");
        assert_eq!(session_id_from_headers(&headers), Some("abc123"));
    }

    #[test]
    fn no_cookie_header_yields_none() {
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn prefix_matches_do_not_leak() {
        // A cookie merely *starting* with the session name is not a match.
        let headers = headers_with_cookie("sessionx=evil");
        assert_eq!(session_id_from_headers(&headers), None);
    }
}
