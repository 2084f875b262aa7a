//! Session Store abstraction
//!
//! The hosted provider owns authentication and row storage. Everything the
//! application needs from it goes through the two traits below so that the
//! client can be constructed once and injected wherever it is used.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::StoreResult,
    models::{AuthUser, CaptionRecord, ImageRecord, RecordId, Session, VoteUpsert, VoteValue},
};

/// OAuth identity providers offered on the sign-in screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    #[default]
    Google,
    Github,
}

impl OAuthProvider {
    /// Get the provider name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
        }
    }
}

/// Parameters of an OAuth sign-in redirect
#[derive(Debug, Clone)]
pub struct SignInRequest<'a> {
    pub provider: OAuthProvider,
    /// Absolute URL the provider sends the user back to
    pub redirect_to: &'a str,
    /// PKCE S256 challenge
    pub code_challenge: &'a str,
}

/// Inclusive row window, `from..=to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub from: usize,
    pub to: usize,
}

impl RowRange {
    /// Window of `limit` rows starting at `offset`, or `None` when the last
    /// row index does not fit in `usize`
    pub fn page(offset: usize, limit: usize) -> Option<Self> {
        offset
            .checked_add(limit.max(1) - 1)
            .map(|to| Self { from: offset, to })
    }

    /// Window of `limit` rows starting at the first row
    pub fn first(limit: usize) -> Self {
        Self {
            from: 0,
            to: limit.max(1) - 1,
        }
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from).saturating_add(1)
    }
}

/// Ordering used when listing captions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionOrder {
    /// `created_datetime_utc` descending
    NewestFirst,
    /// `id` descending
    IdDescending,
}

impl CaptionOrder {
    pub fn column(&self) -> &'static str {
        match self {
            CaptionOrder::NewestFirst => "created_datetime_utc",
            CaptionOrder::IdDescending => "id",
        }
    }
}

/// A user's vote on one caption, as listed for the lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionVote {
    pub caption_id: RecordId,
    pub vote_value: VoteValue,
}

/// Authentication surface of the provider
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// URL that starts an OAuth sign-in with the given provider
    fn authorize_url(&self, request: &SignInRequest<'_>) -> String;

    /// Exchange an authorization code (and the PKCE verifier that produced
    /// its challenge) for a session
    async fn exchange_code_for_session(&self, code: &str, code_verifier: &str)
    -> StoreResult<Session>;

    /// Validate an access token and return its user
    async fn get_user(&self, access_token: &str) -> StoreResult<AuthUser>;

    /// Trade a refresh token for a new session
    async fn refresh_session(&self, refresh_token: &str) -> StoreResult<Session>;

    /// Revoke the session behind an access token
    async fn sign_out(&self, access_token: &str) -> StoreResult<()>;
}

/// Tabular read/upsert surface of the provider.
///
/// `bearer` is the caller's access token; `None` queries with the public key
/// and is subject to the provider's row-level policies.
#[async_trait]
pub trait DataApi: Send + Sync {
    /// Images ordered by id descending, optionally restricted to a window
    async fn list_images(
        &self,
        bearer: Option<&str>,
        range: Option<RowRange>,
    ) -> StoreResult<Vec<ImageRecord>>;

    /// All captions in the requested order
    async fn list_captions(
        &self,
        bearer: Option<&str>,
        order: CaptionOrder,
    ) -> StoreResult<Vec<CaptionRecord>>;

    /// Every vote cast by `profile_id`
    async fn list_votes(&self, bearer: Option<&str>, profile_id: Uuid)
    -> StoreResult<Vec<CaptionVote>>;

    /// Insert or overwrite the vote for `(profile_id, caption_id)`
    async fn upsert_vote(&self, bearer: Option<&str>, vote: &VoteUpsert) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_ranges_are_inclusive() {
        let first = RowRange::first(20);
        assert_eq!((first.from, first.to), (0, 19));
        assert_eq!(first.len(), 20);

        let second = RowRange::page(20, 20).unwrap();
        assert_eq!((second.from, second.to), (20, 39));
        assert_eq!(RowRange::page(0, 20), Some(first));
    }

    #[test]
    fn page_past_the_last_index_is_refused() {
        assert_eq!(RowRange::page(usize::MAX, 20), None);
        assert_eq!(RowRange::page(usize::MAX - 19, 20).map(|r| r.to), Some(usize::MAX));
        assert_eq!(RowRange::page(usize::MAX, 1).map(|r| r.len()), Some(1));
    }

    #[test]
    fn provider_names() {
        assert_eq!(OAuthProvider::default().as_str(), "google");
        let parsed: OAuthProvider = serde_json::from_str("\"github\"").unwrap();
        assert_eq!(parsed, OAuthProvider::Github);
    }
}
