//! Hosted provider configuration

use crate::error::ConfigError;
use std::env;

/// Settings needed to talk to the hosted auth/data provider
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`
    pub url: String,
    /// Public (anonymous) API key
    pub anon_key: String,
    /// Optional JWT secret; enables local access-token verification
    pub jwt_secret: Option<String>,
}

impl SupabaseConfig {
    /// Create a new SupabaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SUPABASE_URL`: project URL (required)
    /// - `SUPABASE_ANON_KEY`: public API key (required)
    /// - `SUPABASE_JWT_SECRET`: HS256 secret used to verify access tokens (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = non_empty_var("SUPABASE_URL");
        let anon_key = non_empty_var("SUPABASE_ANON_KEY");

        let (Some(url), Some(anon_key)) = (url, anon_key) else {
            return Err(ConfigError::MissingSupabaseEnv);
        };

        Self::new(url, anon_key, non_empty_var("SUPABASE_JWT_SECRET"))
    }

    /// Build a config from explicit values
    pub fn new(
        url: impl Into<String>,
        anon_key: impl Into<String>,
        jwt_secret: Option<String>,
    ) -> Result<Self, ConfigError> {
        let url = url.into().trim().trim_end_matches('/').to_string();
        let anon_key = anon_key.into();

        if url.is_empty() || anon_key.is_empty() {
            return Err(ConfigError::MissingSupabaseEnv);
        }

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "SUPABASE_URL",
                reason: format!("expected an http(s) URL, got {url}"),
            });
        }

        Ok(Self {
            url,
            anon_key,
            jwt_secret,
        })
    }

    /// Base URL of the auth endpoints
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.url)
    }

    /// Base URL of the data API
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
