//! Session and PKCE verifier cookies

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::models::Session;
use time::Duration;

use crate::config::WebConfig;

pub const ACCESS_COOKIE: &str = "sb-access-token";
pub const REFRESH_COOKIE: &str = "sb-refresh-token";
pub const VERIFIER_COOKIE: &str = "sb-code-verifier";

/// The verifier only has to outlive one round trip to the provider
const VERIFIER_MAX_AGE: Duration = Duration::minutes(10);

/// Tokens presented by the browser
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentedTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl PresentedTokens {
    pub fn from_jar(jar: &CookieJar) -> Self {
        let value = |name: &str| {
            jar.get(name)
                .map(|cookie| cookie.value().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            access_token: value(ACCESS_COOKIE),
            refresh_token: value(REFRESH_COOKIE),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

fn http_only(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Cookie that tells the browser to drop `name`
pub fn removal(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, ""))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie
}

/// Cookies holding a freshly issued or rotated session
pub fn session_cookies(session: &Session, settings: &WebConfig) -> [Cookie<'static>; 2] {
    let max_age = Duration::seconds(settings.session_cookie_max_age_secs);
    let secure = settings.secure_cookies();

    [
        http_only(ACCESS_COOKIE, session.access_token.clone(), max_age, secure),
        http_only(REFRESH_COOKIE, session.refresh_token.clone(), max_age, secure),
    ]
}

pub fn clearing_cookies(secure: bool) -> [Cookie<'static>; 2] {
    [removal(ACCESS_COOKIE, secure), removal(REFRESH_COOKIE, secure)]
}

pub fn write_session(jar: CookieJar, session: &Session, settings: &WebConfig) -> CookieJar {
    session_cookies(session, settings)
        .into_iter()
        .fold(jar, |jar, cookie| jar.add(cookie))
}

pub fn clear_session(jar: CookieJar, secure: bool) -> CookieJar {
    clearing_cookies(secure)
        .into_iter()
        .fold(jar, |jar, cookie| jar.add(cookie))
}

pub fn write_verifier(jar: CookieJar, verifier: &str, secure: bool) -> CookieJar {
    jar.add(http_only(
        VERIFIER_COOKIE,
        verifier.to_string(),
        VERIFIER_MAX_AGE,
        secure,
    ))
}

/// Read the PKCE verifier and schedule its removal
pub fn take_verifier(jar: CookieJar, secure: bool) -> (CookieJar, Option<String>) {
    let verifier = jar
        .get(VERIFIER_COOKIE)
        .map(|cookie| cookie.value().to_string());
    (jar.add(removal(VERIFIER_COOKIE, secure)), verifier)
}
