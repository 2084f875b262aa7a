//! Web service routes

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    auth::{
        LOGIN_PATH,
        callback::auth_callback,
        login::{login_status, logout, start_login},
        redirect,
        relay::DEFAULT_NEXT,
    },
    captions::{caption_deck, cast_vote},
    gallery::list_images,
    middleware::{RequestSession, session_guard},
    state::AppState,
};

/// Create the router for the web service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/login", get(login_status))
        .route("/auth/login", get(start_login))
        .route("/auth/callback", get(auth_callback))
        .route("/auth/logout", post(logout))
        .route("/protected", get(protected_page))
        .route("/api/images", get(list_images))
        .route("/api/captions/deck", get(caption_deck))
        .route("/api/captions/:id/vote", post(cast_vote))
        .layer(middleware::from_fn_with_state(state.clone(), session_guard))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "web"
    }))
}

/// Page reachable only with a session
pub async fn protected_page(
    State(state): State<AppState>,
    session: Option<RequestSession>,
) -> Response {
    let Some(session) = session else {
        return redirect(
            &state.settings,
            &format!("{LOGIN_PATH}?next={DEFAULT_NEXT}"),
        );
    };

    Json(json!({
        "message": "You are signed in and can access protected content.",
        "email": session.user.email,
    }))
    .into_response()
}
