//! Sign-in initiation, login status and sign-out

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use common::store::{OAuthProvider, SignInRequest};
use oauth2::PkceCodeChallenge;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{CALLBACK_PATH, LOGIN_PATH, cookies, redirect, relay};
use crate::{middleware::RequestSession, state::AppState};

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    #[serde(default)]
    pub provider: OAuthProvider,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginStatus {
    pub signed_in: bool,
    pub email: Option<String>,
    pub next: String,
}

/// `GET /auth/login?next=&provider=`
///
/// Remembers the target in the relay cookie, stores a fresh PKCE verifier and
/// sends the browser to the provider.
pub async fn start_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> Response {
    let settings = &state.settings;
    let secure = settings.secure_cookies();
    let next = relay::safe_next(query.next.as_deref());

    let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
    let callback = settings.url_for(CALLBACK_PATH);
    let authorize_url = state.auth.authorize_url(&SignInRequest {
        provider: query.provider,
        redirect_to: &callback,
        code_challenge: challenge.as_str(),
    });

    info!(
        "Starting {} sign-in, returning to {}",
        query.provider.as_str(),
        next
    );

    let jar = jar.add(relay::encode(&next, secure));
    let jar = cookies::write_verifier(jar, verifier.secret(), secure);
    (jar, (StatusCode::FOUND, [(LOCATION, authorize_url)])).into_response()
}

/// `GET /login?next=`
pub async fn login_status(
    session: Option<RequestSession>,
    Query(query): Query<LoginQuery>,
) -> Json<LoginStatus> {
    Json(LoginStatus {
        signed_in: session.is_some(),
        email: session.and_then(|session| session.user.email),
        next: relay::safe_next(query.next.as_deref()),
    })
}

/// `POST /auth/logout`
///
/// Session cookies are cleared even when the provider fails to revoke the
/// session.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    session: Option<RequestSession>,
) -> Response {
    let settings = &state.settings;
    let jar = cookies::clear_session(jar, settings.secure_cookies());

    if let Some(session) = session {
        if let Err(e) = state.auth.sign_out(&session.access_token).await {
            error!("Failed to revoke session for user {}: {}", session.user.id, e);
            return (
                StatusCode::BAD_GATEWAY,
                jar,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
        info!("Signed out user {}", session.user.id);
    }

    (jar, redirect(settings, LOGIN_PATH)).into_response()
}
