//! Auth Gateway: completes the OAuth round trip

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use super::{LOGIN_PATH, cookies, redirect, relay};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
}

/// `GET /auth/callback?code=&next=`
///
/// Exchanges the authorization code for a session and sends the browser to
/// the relayed target. A failed exchange goes back to the login page. Either
/// way the relay cookie is cleared.
pub async fn auth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let settings = &state.settings;
    let secure = settings.secure_cookies();
    let target = relay::decode(
        query.next.as_deref(),
        jar.get(relay::RELAY_COOKIE).map(|cookie| cookie.value()),
    );

    let (mut jar, verifier) = cookies::take_verifier(jar, secure);

    if let Some(code) = query.code {
        let exchanged = state
            .auth
            .exchange_code_for_session(&code, verifier.as_deref().unwrap_or_default())
            .await;

        match exchanged {
            Ok(session) => {
                info!("Signed in user {}", session.user.id);
                jar = cookies::write_session(jar, &session, settings);
            }
            Err(e) => {
                warn!("Code exchange failed: {}", e);
                let jar = relay::clear(jar, secure);
                return (jar, redirect(settings, LOGIN_PATH)).into_response();
            }
        }
    }

    let jar = relay::clear(jar, secure);
    (jar, redirect(settings, &target)).into_response()
}
