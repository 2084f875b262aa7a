//! Sign-in flow: relay cookie, session cookies, OAuth callback and sign-out

pub mod callback;
pub mod cookies;
pub mod login;
pub mod relay;

use axum::{
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

use crate::config::WebConfig;

pub const LOGIN_PATH: &str = "/login";
pub const CALLBACK_PATH: &str = "/auth/callback";

/// `302 Found` to a path on this site
pub fn redirect(settings: &WebConfig, path: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, settings.url_for(path))]).into_response()
}
