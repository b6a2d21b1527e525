use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use crate::AppState;

/// Routes reachable without a session.
const PUBLIC_PATHS: &[&str] = &["/", "/login", "/about", "/privacy", "/terms", "/health"];

fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Static assets bypass the guard: anything under /static/ plus files
/// served from the root by extension (favicon.ico, robots.txt).
fn is_static_asset(path: &str) -> bool {
    if path.starts_with("/static/") {
        return true;
    }
    path.rsplit('/').next().is_some_and(|segment| segment.contains('.'))
}

/// A cookie slot can survive with a stringified empty value after a buggy
/// client writes through it. Treat those the same as an absent cookie.
fn is_usable_token(value: &str) -> bool {
    !value.is_empty() && value != "undefined" && value != "null"
}

#[derive(Serialize)]
struct RedirectQuery<'a> {
    redirect: &'a str,
}

fn login_redirect(requested_path: &str) -> Response {
    let query = serde_urlencoded::to_string(RedirectQuery {
        redirect: requested_path,
    })
    .unwrap_or_default();
    let target = format!("/login?{}", query);
    tracing::debug!(path = requested_path, "redirecting unauthenticated request");
    Redirect::to(&target).into_response()
}

/// Presence-only session check at the edge. The cookie is not validated
/// here; the backend rejects bad tokens and the interceptor handles the
/// resulting 401.
pub async fn route_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if is_public_path(&path) || is_static_asset(&path) {
        return next.run(request).await;
    }

    let has_session = jar
        .get(&state.settings.session.cookie_name)
        .map(|cookie| is_usable_token(cookie.value()))
        .unwrap_or(false);

    if has_session {
        next.run(request).await
    } else {
        login_redirect(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_are_exact_matches() {
        assert!(is_public_path("/"));
        assert!(is_public_path("/login"));
        assert!(is_public_path("/about"));
        assert!(!is_public_path("/chapters/5"));
        assert!(!is_public_path("/login/extra"));
    }

    #[test]
    fn static_assets_are_recognized() {
        assert!(is_static_asset("/static/css/site.css"));
        assert!(is_static_asset("/favicon.ico"));
        assert!(!is_static_asset("/chapters/5"));
        assert!(!is_static_asset("/profile"));
    }

    #[test]
    fn stringified_empty_values_are_not_tokens() {
        assert!(!is_usable_token(""));
        assert!(!is_usable_token("undefined"));
        assert!(!is_usable_token("null"));
        assert!(is_usable_token("eyJhbGciOi.payload.sig"));
    }

    #[test]
    fn redirect_target_encodes_the_requested_path() {
        let response = login_redirect("/chapters/5");
        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .unwrap();
        assert_eq!(location, "/login?redirect=%2Fchapters%2F5");
    }
}
