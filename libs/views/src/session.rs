//! Client session handle
//!
//! Wraps the injected auth client and publishes the current session on a
//! watch channel so that views can follow sign-in and sign-out.

use common::{
    error::StoreResult,
    models::Session,
    store::{AuthApi, OAuthProvider, SignInRequest},
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Clone)]
pub struct SessionHandle {
    auth: Arc<dyn AuthApi>,
    sender: Arc<watch::Sender<Option<Session>>>,
}

impl SessionHandle {
    pub fn new(auth: Arc<dyn AuthApi>, initial: Option<Session>) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            auth,
            sender: Arc::new(sender),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.sender.borrow().clone()
    }

    /// Subscribe to auth state changes
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sender.subscribe()
    }

    pub fn set(&self, session: Option<Session>) {
        self.sender.send_replace(session);
    }

    pub fn sign_in_url(&self, provider: OAuthProvider, redirect_to: &str, challenge: &str) -> String {
        self.auth.authorize_url(&SignInRequest {
            provider,
            redirect_to,
            code_challenge: challenge,
        })
    }

    /// Exchange an authorization code and publish the new session
    pub async fn complete_sign_in(&self, code: &str, code_verifier: &str) -> StoreResult<Session> {
        let session = self
            .auth
            .exchange_code_for_session(code, code_verifier)
            .await?;
        info!("Signed in as {}", session.user.display_name());
        self.set(Some(session.clone()));
        Ok(session)
    }

    /// Revoke the session at the provider. The local session is cleared even
    /// when revocation fails.
    pub async fn sign_out(&self) -> StoreResult<()> {
        let result = match self.current() {
            Some(session) => self.auth.sign_out(&session.access_token).await,
            None => Ok(()),
        };
        if let Err(e) = &result {
            warn!("Sign-out failed at the provider: {}", e);
        }
        self.set(None);
        result
    }
}
