//! HTTP client for the hosted auth (`/auth/v1`) and data (`/rest/v1`) APIs

mod auth;
mod rest;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::{
    config::SupabaseConfig,
    error::{StoreError, StoreResult},
};

/// Provider client. Construct once per process and share it.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    /// Create a new client
    pub fn new(config: SupabaseConfig) -> StoreResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("caption-gallery/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!("Provider client initialized for {}", config.url);
        Ok(Self { http, config })
    }

    /// Attach the public key plus the caller's token (or the public key when
    /// there is no caller)
    fn authorized(&self, request: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.config.anon_key))
    }
}

/// Which API a response came from; decides the error variant
#[derive(Debug, Clone, Copy)]
enum Api {
    Auth,
    Rest,
}

/// Turn a non-success response into a `StoreError`
async fn error_from(api: Api, response: Response) -> StoreError {
    let status = response.status().as_u16();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    let message = ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .unwrap_or("request failed")
        .to_string();

    match api {
        Api::Auth => StoreError::Auth { status, message },
        Api::Rest => StoreError::Rest {
            status,
            code: body.get("code").and_then(Value::as_str).map(str::to_string),
            message,
        },
    }
}

/// Send a request and decode a JSON body
async fn send_json<T: DeserializeOwned>(api: Api, request: RequestBuilder) -> StoreResult<T> {
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(error_from(api, response).await);
    }

    response
        .json::<T>()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

/// Send a request whose body is not needed
async fn send_empty(api: Api, request: RequestBuilder) -> StoreResult<()> {
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(error_from(api, response).await);
    }
    Ok(())
}
