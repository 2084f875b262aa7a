//! Redirect Target Relay
//!
//! Carries the post-login destination across the OAuth round trip in a short
//! lived cookie. The cookie is read once by the callback and then cleared.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use super::cookies::removal;

pub const RELAY_COOKIE: &str = "sb-next";
pub const DEFAULT_NEXT: &str = "/protected";

const RELAY_MAX_AGE: Duration = Duration::seconds(600);

/// Only same-site paths are allowed as targets
pub fn safe_next(value: Option<&str>) -> String {
    match value {
        Some(path) if path.starts_with('/') => path.to_string(),
        _ => DEFAULT_NEXT.to_string(),
    }
}

pub fn encode(target: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((RELAY_COOKIE, safe_next(Some(target))))
        .path("/")
        .max_age(RELAY_MAX_AGE)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Pick the target: the query parameter wins whenever it is present
pub fn decode(query: Option<&str>, cookie: Option<&str>) -> String {
    safe_next(query.or(cookie))
}

pub fn clear(jar: CookieJar, secure: bool) -> CookieJar {
    jar.add(removal(RELAY_COOKIE, secure))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_must_be_paths() {
        for input in ["", "https://evil.example", "protected", "javascript:alert(1)"] {
            assert_eq!(decode(Some(input), None), DEFAULT_NEXT, "input {input:?}");
        }
        assert_eq!(decode(None, None), DEFAULT_NEXT);
    }

    #[test]
    fn paths_pass_through_unchanged() {
        for input in ["/", "/list", "/protected?tab=votes", "//double"] {
            assert_eq!(decode(Some(input), None), input);
        }
    }

    #[test]
    fn query_beats_cookie() {
        assert_eq!(decode(Some("/list"), Some("/other")), "/list");
        assert_eq!(decode(None, Some("/other")), "/other");
        assert_eq!(decode(Some(""), Some("/other")), DEFAULT_NEXT);
    }

    #[test]
    fn encoded_cookie_attributes() {
        let cookie = encode("/list", true);
        assert_eq!(cookie.name(), RELAY_COOKIE);
        assert_eq!(cookie.value(), "/list");
        assert_eq!(cookie.max_age(), Some(Duration::seconds(600)));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));

        assert_eq!(encode("elsewhere", false).value(), DEFAULT_NEXT);
    }

    #[test]
    fn clearing_writes_an_empty_expired_cookie() {
        let jar = clear(CookieJar::new(), false);
        let cookie = jar.get(RELAY_COOKIE).unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
