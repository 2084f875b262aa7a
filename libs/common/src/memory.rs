//! In-memory Session Store used by tests
//!
//! Mimics the provider closely enough to exercise the gateway, the guard and
//! the view models: one-shot authorization codes, rotating refresh tokens,
//! id-descending listings and the `(profile_id, caption_id)` upsert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::{StoreError, StoreResult},
    models::{AuthUser, CaptionRecord, ImageRecord, Session, VoteRecord, VoteUpsert},
    store::{AuthApi, CaptionOrder, CaptionVote, DataApi, RowRange, SignInRequest},
};

/// Operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    ListImages,
    ListCaptions,
    ListVotes,
    UpsertVote,
    SignOut,
}

#[derive(Default)]
struct Inner {
    codes: HashMap<String, AuthUser>,
    access_tokens: HashMap<String, AuthUser>,
    refresh_tokens: HashMap<String, AuthUser>,
    images: Vec<ImageRecord>,
    captions: Vec<(CaptionRecord, Option<DateTime<Utc>>)>,
    votes: Vec<VoteRecord>,
    created_column_missing: bool,
    failures: HashSet<Failure>,
    upsert_calls: usize,
}

impl Inner {
    fn check(&self, failure: Failure) -> StoreResult<()> {
        if self.failures.contains(&failure) {
            return Err(StoreError::Rest {
                status: 500,
                code: None,
                message: format!("{failure:?} failed"),
            });
        }
        Ok(())
    }

    fn mint(&mut self, user: AuthUser) -> Session {
        let access_token = format!("access-{}", Uuid::new_v4());
        let refresh_token = format!("refresh-{}", Uuid::new_v4());
        self.access_tokens.insert(access_token.clone(), user.clone());
        self.refresh_tokens.insert(refresh_token.clone(), user.clone());

        Session {
            access_token,
            refresh_token,
            expires_at: Some(Utc::now().timestamp() + 3600),
            user,
        }
    }
}

/// Shared, cloneable in-memory store
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a one-shot authorization code for `user`
    pub async fn issue_code(&self, code: &str, user: AuthUser) {
        self.inner.lock().await.codes.insert(code.to_string(), user);
    }

    /// Create a session without going through the code exchange
    pub async fn issue_session(&self, user: AuthUser) -> Session {
        self.inner.lock().await.mint(user)
    }

    /// Invalidate an access token while keeping its refresh token usable
    pub async fn expire_access_token(&self, access_token: &str) {
        self.inner.lock().await.access_tokens.remove(access_token);
    }

    pub async fn add_image(&self, image: ImageRecord) {
        self.inner.lock().await.images.push(image);
    }

    pub async fn add_caption(&self, caption: CaptionRecord, created: Option<DateTime<Utc>>) {
        self.inner.lock().await.captions.push((caption, created));
    }

    pub async fn add_vote(&self, vote: VoteRecord) {
        self.inner.lock().await.votes.push(vote);
    }

    /// Make ordering by creation time fail as if the column did not exist
    pub async fn drop_created_column(&self) {
        self.inner.lock().await.created_column_missing = true;
    }

    pub async fn fail(&self, failure: Failure) {
        self.inner.lock().await.failures.insert(failure);
    }

    pub async fn recover(&self, failure: Failure) {
        self.inner.lock().await.failures.remove(&failure);
    }

    /// Snapshot of every stored vote
    pub async fn votes(&self) -> Vec<VoteRecord> {
        self.inner.lock().await.votes.clone()
    }

    /// Number of upsert attempts that reached the store
    pub async fn upsert_calls(&self) -> usize {
        self.inner.lock().await.upsert_calls
    }

    /// Whether an access token is still accepted
    pub async fn is_active(&self, access_token: &str) -> bool {
        self.inner
            .lock()
            .await
            .access_tokens
            .contains_key(access_token)
    }
}

fn unauthorized(message: &str) -> StoreError {
    StoreError::Auth {
        status: 401,
        message: message.to_string(),
    }
}

#[async_trait]
impl AuthApi for MemoryStore {
    fn authorize_url(&self, request: &SignInRequest<'_>) -> String {
        format!(
            "https://auth.test/authorize?provider={}&redirect_to={}&code_challenge={}",
            request.provider.as_str(),
            request.redirect_to,
            request.code_challenge
        )
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> StoreResult<Session> {
        let mut inner = self.inner.lock().await;
        if code_verifier.is_empty() {
            return Err(StoreError::Auth {
                status: 400,
                message: "code verifier missing".to_string(),
            });
        }

        let user = inner.codes.remove(code).ok_or_else(|| StoreError::Auth {
            status: 400,
            message: "invalid flow state, no valid flow state found".to_string(),
        })?;

        Ok(inner.mint(user))
    }

    async fn get_user(&self, access_token: &str) -> StoreResult<AuthUser> {
        self.inner
            .lock()
            .await
            .access_tokens
            .get(access_token)
            .cloned()
            .ok_or_else(|| unauthorized("invalid JWT"))
    }

    async fn refresh_session(&self, refresh_token: &str) -> StoreResult<Session> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| unauthorized("Invalid Refresh Token"))?;

        Ok(inner.mint(user))
    }

    async fn sign_out(&self, access_token: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.check(Failure::SignOut)?;

        let user = inner
            .access_tokens
            .get(access_token)
            .cloned()
            .ok_or_else(|| unauthorized("invalid JWT"))?;

        inner.access_tokens.retain(|_, owner| owner.id != user.id);
        inner.refresh_tokens.retain(|_, owner| owner.id != user.id);
        Ok(())
    }
}

#[async_trait]
impl DataApi for MemoryStore {
    async fn list_images(
        &self,
        _bearer: Option<&str>,
        range: Option<RowRange>,
    ) -> StoreResult<Vec<ImageRecord>> {
        let inner = self.inner.lock().await;
        inner.check(Failure::ListImages)?;

        let mut images = inner.images.clone();
        images.sort_by(|a, b| b.id.cmp(&a.id));

        Ok(match range {
            Some(range) => images
                .into_iter()
                .skip(range.from)
                .take(range.len())
                .collect(),
            None => images,
        })
    }

    async fn list_captions(
        &self,
        _bearer: Option<&str>,
        order: CaptionOrder,
    ) -> StoreResult<Vec<CaptionRecord>> {
        let inner = self.inner.lock().await;
        inner.check(Failure::ListCaptions)?;

        if order == CaptionOrder::NewestFirst && inner.created_column_missing {
            return Err(StoreError::Rest {
                status: 400,
                code: Some("42703".to_string()),
                message: "column captions.created_datetime_utc does not exist".to_string(),
            });
        }

        let mut captions = inner.captions.clone();
        match order {
            CaptionOrder::NewestFirst => captions.sort_by(|a, b| b.1.cmp(&a.1)),
            CaptionOrder::IdDescending => captions.sort_by(|a, b| b.0.id.cmp(&a.0.id)),
        }

        Ok(captions.into_iter().map(|(caption, _)| caption).collect())
    }

    async fn list_votes(
        &self,
        _bearer: Option<&str>,
        profile_id: Uuid,
    ) -> StoreResult<Vec<CaptionVote>> {
        let inner = self.inner.lock().await;
        inner.check(Failure::ListVotes)?;

        Ok(inner
            .votes
            .iter()
            .filter(|vote| vote.profile_id == profile_id)
            .map(|vote| CaptionVote {
                caption_id: vote.caption_id.clone(),
                vote_value: vote.vote_value,
            })
            .collect())
    }

    async fn upsert_vote(&self, _bearer: Option<&str>, vote: &VoteUpsert) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.upsert_calls += 1;
        inner.check(Failure::UpsertVote)?;

        let caption_known = inner
            .captions
            .iter()
            .any(|(caption, _)| caption.id == vote.caption_id);
        if !caption_known {
            return Err(StoreError::Rest {
                status: 409,
                code: Some("23503".to_string()),
                message: "insert or update on table \"caption_votes\" violates foreign key constraint"
                    .to_string(),
            });
        }

        let now = Utc::now();
        let existing = inner
            .votes
            .iter()
            .position(|row| row.profile_id == vote.profile_id && row.caption_id == vote.caption_id);

        match existing {
            Some(index) => {
                let row = &mut inner.votes[index];
                row.vote_value = vote.vote_value;
                row.modified_datetime_utc = Some(vote.modified_datetime_utc.unwrap_or(now));
            }
            None => inner.votes.push(VoteRecord {
                profile_id: vote.profile_id,
                caption_id: vote.caption_id.clone(),
                vote_value: vote.vote_value,
                created_datetime_utc: vote.created_datetime_utc,
                modified_datetime_utc: vote.modified_datetime_utc,
            }),
        }

        Ok(())
    }
}
