//! Caption Voting View
//!
//! Walks the signed-in user through captions one at a time. Each caption can
//! be voted up or down once per user; later votes overwrite the earlier one.

use chrono::{DateTime, Utc};
use common::{
    error::StoreResult,
    models::{AuthUser, CaptionRecord, RecordId, Session, VoteUpsert, VoteValue},
    store::{CaptionOrder, DataApi},
};
use std::collections::{HashMap, HashSet};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::lifecycle::{Lifecycle, LoadTicket};

pub const SIGN_IN_TO_VOTE: &str = "Please sign in to vote.";
pub const VOTE_FAILED: &str = "Unable to record vote. Please try again.";
pub const VOTE_RECORDED: &str = "Vote recorded.";

/// Everything the voting screen needs for one user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deck {
    pub captions: Vec<CaptionRecord>,
    pub image_urls: HashMap<RecordId, String>,
    pub votes: HashMap<RecordId, VoteValue>,
}

impl Deck {
    /// Index of the first caption the user has not voted on, or 0
    pub fn first_unvoted(&self) -> usize {
        self.captions
            .iter()
            .position(|caption| !self.votes.contains_key(&caption.id))
            .unwrap_or(0)
    }

    pub fn remaining(&self) -> usize {
        self.captions
            .iter()
            .filter(|caption| !self.votes.contains_key(&caption.id))
            .count()
    }

    pub fn image_url(&self, caption: &CaptionRecord) -> Option<&str> {
        caption
            .image_id
            .as_ref()
            .and_then(|id| self.image_urls.get(id))
            .map(String::as_str)
    }
}

/// Captions newest first, or by id when ordering by creation time fails
pub async fn load_captions(
    data: &dyn DataApi,
    bearer: Option<&str>,
) -> StoreResult<Vec<CaptionRecord>> {
    match data.list_captions(bearer, CaptionOrder::NewestFirst).await {
        Ok(captions) => Ok(captions),
        Err(e) => {
            warn!("Ordering captions by creation time failed, using id: {}", e);
            data.list_captions(bearer, CaptionOrder::IdDescending).await
        }
    }
}

/// Load captions, image urls and the user's votes, in that order
pub async fn load_deck(
    data: &dyn DataApi,
    bearer: Option<&str>,
    user: &AuthUser,
) -> StoreResult<Deck> {
    let captions = load_captions(data, bearer).await?;

    let image_urls = data
        .list_images(bearer, None)
        .await?
        .into_iter()
        .filter(|image| !image.url.is_empty())
        .map(|image| (image.id, image.url))
        .collect();

    let votes = data
        .list_votes(bearer, user.id)
        .await?
        .into_iter()
        .map(|vote| (vote.caption_id, vote.vote_value))
        .collect();

    Ok(Deck {
        captions,
        image_urls,
        votes,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckState {
    SignedOut,
    Loading,
    Error(String),
    Ready,
}

/// Arrow keys on the voting screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    ArrowLeft,
    ArrowRight,
}

/// A vote write the view is waiting on
#[derive(Debug, Clone)]
pub struct PendingVote {
    pub ticket: LoadTicket,
    pub bearer: String,
    pub upsert: VoteUpsert,
}

#[derive(Debug)]
pub struct VotingView {
    session: Option<Session>,
    state: DeckState,
    deck: Deck,
    cursor: usize,
    in_flight: HashSet<RecordId>,
    feedback: Option<String>,
    lifecycle: Lifecycle,
}

impl Default for VotingView {
    fn default() -> Self {
        Self {
            session: None,
            state: DeckState::Loading,
            deck: Deck::default(),
            cursor: 0,
            in_flight: HashSet::new(),
            feedback: None,
            lifecycle: Lifecycle::default(),
        }
    }
}

impl VotingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DeckState {
        &self.state
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.session.as_ref().map(|session| &session.user)
    }

    pub fn is_in_flight(&self, caption_id: &RecordId) -> bool {
        self.in_flight.contains(caption_id)
    }

    pub fn vote_for(&self, caption_id: &RecordId) -> Option<VoteValue> {
        self.deck.votes.get(caption_id).copied()
    }

    /// Start (re)loading for `session`. Returns `None` when signed out.
    pub fn begin_load(&mut self, session: Option<Session>) -> Option<LoadTicket> {
        self.lifecycle.invalidate();
        self.session = session;
        self.deck = Deck::default();
        self.cursor = 0;
        self.in_flight.clear();
        self.feedback = None;

        if self.session.is_none() {
            self.state = DeckState::SignedOut;
            return None;
        }

        self.state = DeckState::Loading;
        Some(self.lifecycle.issue())
    }

    pub fn complete_load(&mut self, ticket: LoadTicket, result: StoreResult<Deck>) -> bool {
        if !self.lifecycle.accepts(ticket) {
            return false;
        }

        match result {
            Ok(deck) => {
                self.cursor = deck.first_unvoted();
                info!(
                    "Loaded {} captions, {} already voted",
                    deck.captions.len(),
                    deck.votes.len()
                );
                self.deck = deck;
                self.state = DeckState::Ready;
            }
            Err(e) => {
                error!("Failed to load captions: {}", e);
                self.deck = Deck::default();
                self.cursor = 0;
                self.state = DeckState::Error(e.to_string());
            }
        }
        true
    }

    pub async fn load(&mut self, data: &dyn DataApi, session: Option<Session>) {
        let Some(ticket) = self.begin_load(session) else {
            return;
        };
        let Some(session) = self.session.clone() else {
            return;
        };

        let result = load_deck(data, Some(&session.access_token), &session.user).await;
        self.complete_load(ticket, result);
    }

    /// Reload when the watched session changed since the last look
    pub async fn sync_session(
        &mut self,
        data: &dyn DataApi,
        session: &mut watch::Receiver<Option<Session>>,
    ) -> bool {
        if !session.has_changed().unwrap_or(false) {
            return false;
        }
        let current = session.borrow_and_update().clone();
        self.load(data, current).await;
        true
    }

    /// Start a vote. Returns `None` when a vote for the caption is already
    /// in flight or nobody is signed in.
    pub fn begin_vote(
        &mut self,
        caption_id: &RecordId,
        value: VoteValue,
        now: DateTime<Utc>,
    ) -> Option<PendingVote> {
        if self.in_flight.contains(caption_id) {
            return None;
        }

        let Some(session) = self.session.as_ref() else {
            self.feedback = Some(SIGN_IN_TO_VOTE.to_string());
            return None;
        };

        let upsert = VoteUpsert::new(
            session.user.id,
            caption_id.clone(),
            value,
            self.deck.votes.contains_key(caption_id),
            now,
        );
        let pending = PendingVote {
            ticket: self.lifecycle.issue(),
            bearer: session.access_token.clone(),
            upsert,
        };

        self.in_flight.insert(caption_id.clone());
        self.feedback = None;
        Some(pending)
    }

    pub fn complete_vote(&mut self, pending: &PendingVote, result: StoreResult<()>) {
        if !self.lifecycle.accepts(pending.ticket) {
            return;
        }

        let caption_id = &pending.upsert.caption_id;
        self.in_flight.remove(caption_id);
        match result {
            Ok(()) => {
                self.deck
                    .votes
                    .insert(caption_id.clone(), pending.upsert.vote_value);
                self.feedback = Some(VOTE_RECORDED.to_string());
            }
            Err(e) => {
                error!("Failed to record vote on {}: {}", caption_id, e);
                self.feedback = Some(VOTE_FAILED.to_string());
            }
        }
    }

    pub async fn vote(&mut self, data: &dyn DataApi, caption_id: &RecordId, value: VoteValue) {
        let Some(pending) = self.begin_vote(caption_id, value, Utc::now()) else {
            return;
        };
        let result = data.upsert_vote(Some(&pending.bearer), &pending.upsert).await;
        self.complete_vote(&pending, result);
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&CaptionRecord> {
        self.deck.captions.get(self.cursor)
    }

    pub fn current_image_url(&self) -> Option<&str> {
        self.current().and_then(|caption| self.deck.image_url(caption))
    }

    pub fn can_prev(&self) -> bool {
        self.cursor > 0
    }

    /// Moving forward requires a recorded vote on the current caption
    pub fn can_next(&self) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        self.cursor + 1 < self.deck.captions.len() && self.deck.votes.contains_key(&current.id)
    }

    pub fn prev(&mut self) -> bool {
        if !self.can_prev() {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Arrow navigation. Unlike `next`, this does not require a vote.
    pub fn handle_key(&mut self, key: NavKey) {
        let last = self.deck.captions.len().saturating_sub(1);
        self.cursor = match key {
            NavKey::ArrowLeft => self.cursor.saturating_sub(1),
            NavKey::ArrowRight => (self.cursor + 1).min(last),
        };
    }

    pub fn position(&self) -> String {
        let total = self.deck.captions.len();
        let index = if total == 0 { 0 } else { self.cursor + 1 };
        format!("CAPTION {index} / {total}")
    }

    pub fn remaining(&self) -> usize {
        self.deck.remaining()
    }
}
