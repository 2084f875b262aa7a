//! Route guard: session refresh on every request
//!
//! The guard never rejects a request. It resolves the session from the
//! cookies, refreshes it once when the access token is no longer accepted,
//! and leaves enforcement to the handlers through [`RequestSession`].

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderValue, Request, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use common::{error::StoreError, models::AuthUser};
use tracing::{debug, error, info, warn};

use crate::{
    auth::cookies::{self, PresentedTokens},
    error::ApiError,
    state::AppState,
};

/// Paths served without touching the session
const STATIC_PREFIXES: [&str; 2] = ["/static/", "/assets/"];
const FAVICON: &str = "/favicon.ico";

/// Session resolved by the guard for the current request
#[derive(Debug, Clone)]
pub struct RequestSession {
    pub user: AuthUser,
    pub access_token: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestSession>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// Outcome of resolving the presented cookies
#[derive(Debug, Default)]
struct Resolution {
    session: Option<RequestSession>,
    cookies: Vec<Cookie<'static>>,
}

fn is_static(path: &str) -> bool {
    path == FAVICON || STATIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Validate the access token locally when a verifier is configured, otherwise
/// ask the provider
async fn validate(state: &AppState, access_token: &str) -> Option<AuthUser> {
    match &state.verifier {
        Some(verifier) => verifier
            .verify(access_token)
            .inspect_err(|rejection| debug!("Access token rejected locally: {:?}", rejection))
            .ok(),
        None => state
            .auth
            .get_user(access_token)
            .await
            .inspect_err(|e| debug!("Access token rejected by provider: {}", e))
            .ok(),
    }
}

async fn resolve(state: &AppState, tokens: PresentedTokens) -> Resolution {
    if tokens.is_empty() {
        return Resolution::default();
    }

    if let Some(access_token) = tokens.access_token {
        if let Some(user) = validate(state, &access_token).await {
            return Resolution {
                session: Some(RequestSession { user, access_token }),
                cookies: Vec::new(),
            };
        }
    }

    let secure = state.settings.secure_cookies();
    let Some(refresh_token) = tokens.refresh_token else {
        debug!("Access token unusable and no refresh token, clearing session");
        return Resolution {
            session: None,
            cookies: cookies::clearing_cookies(secure).to_vec(),
        };
    };

    match state.auth.refresh_session(&refresh_token).await {
        Ok(session) => {
            info!("Refreshed session for user {}", session.user.id);
            Resolution {
                cookies: cookies::session_cookies(&session, &state.settings).to_vec(),
                session: Some(RequestSession {
                    user: session.user,
                    access_token: session.access_token,
                }),
            }
        }
        Err(e @ StoreError::Auth { .. }) => {
            warn!("Refresh token rejected, clearing session: {}", e);
            Resolution {
                session: None,
                cookies: cookies::clearing_cookies(secure).to_vec(),
            }
        }
        Err(e) => {
            error!("Session refresh failed: {}", e);
            Resolution::default()
        }
    }
}

/// Names of cookies the handler already set on the response
fn cookies_set_by_handler(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split('=').next())
        .map(|name| name.trim().to_string())
        .collect()
}

/// Session guard middleware
pub async fn session_guard(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if is_static(req.uri().path()) {
        return next.run(req).await;
    }

    let resolution = resolve(&state, PresentedTokens::from_jar(&jar)).await;
    if let Some(session) = resolution.session {
        req.extensions_mut().insert(session);
    }

    let mut response = next.run(req).await;

    let already_set = cookies_set_by_handler(&response);
    for cookie in resolution.cookies {
        if already_set.iter().any(|name| name == cookie.name()) {
            continue;
        }
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => error!("Failed to encode cookie {}: {}", cookie.name(), e),
        }
    }

    response
}
