//! Auth endpoints: PKCE code exchange, user lookup, refresh and sign-out

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{Api, SupabaseClient, send_empty, send_json};
use crate::{
    error::StoreResult,
    models::{AuthUser, Session},
    store::{AuthApi, SignInRequest},
};

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        let expires_at = token.expires_at.or_else(|| {
            token
                .expires_in
                .map(|seconds| Utc::now().timestamp() + seconds)
        });

        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            user: token.user,
        }
    }
}

#[async_trait]
impl AuthApi for SupabaseClient {
    fn authorize_url(&self, request: &SignInRequest<'_>) -> String {
        let base = format!("{}/authorize", self.config.auth_url());
        let params = [
            ("provider", request.provider.as_str()),
            ("redirect_to", request.redirect_to),
            ("code_challenge", request.code_challenge),
            ("code_challenge_method", "s256"),
        ];

        match Url::parse_with_params(&base, &params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                // The base URL was validated when the config was built.
                warn!("Failed to build authorize URL: {}", e);
                base
            }
        }
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> StoreResult<Session> {
        info!("Exchanging authorization code for a session");

        let request = self
            .authorized(
                self.http
                    .post(format!("{}/token", self.config.auth_url()))
                    .query(&[("grant_type", "pkce")]),
                None,
            )
            .json(&json!({
                "auth_code": code,
                "code_verifier": code_verifier,
            }));

        let token: TokenResponse = send_json(Api::Auth, request).await?;
        Ok(token.into())
    }

    async fn get_user(&self, access_token: &str) -> StoreResult<AuthUser> {
        let request = self.authorized(
            self.http.get(format!("{}/user", self.config.auth_url())),
            Some(access_token),
        );

        send_json(Api::Auth, request).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> StoreResult<Session> {
        info!("Refreshing session");

        let request = self
            .authorized(
                self.http
                    .post(format!("{}/token", self.config.auth_url()))
                    .query(&[("grant_type", "refresh_token")]),
                None,
            )
            .json(&json!({ "refresh_token": refresh_token }));

        let token: TokenResponse = send_json(Api::Auth, request).await?;
        Ok(token.into())
    }

    async fn sign_out(&self, access_token: &str) -> StoreResult<()> {
        info!("Signing out");

        let request = self.authorized(
            self.http
                .post(format!("{}/logout", self.config.auth_url()))
                .query(&[("scope", "global")]),
            Some(access_token),
        );

        send_empty(Api::Auth, request).await
    }
}
