//! Web service settings

use serde::Deserialize;

/// Default session cookie lifetime: 400 days
pub const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 400 * 24 * 60 * 60;

/// Settings of the web service
///
/// # Environment Variables
/// - `GALLERY_BIND_ADDR`: listen address (default: `0.0.0.0:3000`)
/// - `GALLERY_SITE_URL`: public origin of the site (default: `http://localhost:3000`)
/// - `GALLERY_SESSION_COOKIE_MAX_AGE_SECS`: session cookie lifetime (default: 400 days)
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    pub bind_addr: String,
    pub site_url: String,
    pub session_cookie_max_age_secs: i64,
}

impl WebConfig {
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let settings = ::config::Config::builder()
            .set_default("bind_addr", "0.0.0.0:3000")?
            .set_default("site_url", "http://localhost:3000")?
            .set_default("session_cookie_max_age_secs", DEFAULT_SESSION_MAX_AGE_SECS)?
            .add_source(::config::Environment::with_prefix("GALLERY").try_parsing(true))
            .build()?;

        let mut web: WebConfig = settings.try_deserialize()?;
        web.site_url = web.site_url.trim_end_matches('/').to_string();
        Ok(web)
    }

    /// Cookies carry `Secure` when the site is served over HTTPS
    pub fn secure_cookies(&self) -> bool {
        self.site_url.starts_with("https://")
    }

    /// Absolute URL of a path on this site
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.site_url, path)
    }
}
