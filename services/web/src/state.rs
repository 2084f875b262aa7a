//! Application state shared across handlers

use common::{
    claims::TokenVerifier,
    store::{AuthApi, DataApi},
};
use std::sync::Arc;

use crate::config::WebConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthApi>,
    pub data: Arc<dyn DataApi>,
    /// Present when the JWT secret is configured
    pub verifier: Option<TokenVerifier>,
    pub settings: Arc<WebConfig>,
}
