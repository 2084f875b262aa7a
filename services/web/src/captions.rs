//! Caption voting endpoints

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use common::{
    error::StoreError,
    models::{RecordId, VoteUpsert, VoteValue},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use views::voting::{VOTE_FAILED, VOTE_RECORDED, load_deck};

use crate::{
    error::{ApiError, ApiResult},
    middleware::RequestSession,
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckCaption {
    pub id: RecordId,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub vote: Option<VoteValue>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeckResponse {
    pub captions: Vec<DeckCaption>,
    /// First caption without a vote, or 0
    pub cursor: usize,
    pub remaining: usize,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote_value: VoteValue,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub caption_id: RecordId,
    pub vote_value: VoteValue,
    pub message: String,
}

/// `GET /api/captions/deck`
pub async fn caption_deck(
    State(state): State<AppState>,
    session: Option<RequestSession>,
) -> ApiResult<Json<DeckResponse>> {
    let session = session.ok_or(ApiError::SignInRequired)?;

    let deck = load_deck(
        state.data.as_ref(),
        Some(&session.access_token),
        &session.user,
    )
    .await
    .inspect_err(|e| error!("Failed to load caption deck: {}", e))?;

    let captions = deck
        .captions
        .iter()
        .map(|caption| DeckCaption {
            id: caption.id.clone(),
            content: caption.content.clone(),
            image_url: deck.image_url(caption).map(str::to_string),
            vote: deck.votes.get(&caption.id).copied(),
        })
        .collect();

    Ok(Json(DeckResponse {
        captions,
        cursor: deck.first_unvoted(),
        remaining: deck.remaining(),
    }))
}

/// `POST /api/captions/:id/vote`
pub async fn cast_vote(
    State(state): State<AppState>,
    session: Option<RequestSession>,
    Path(caption_id): Path<String>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<Json<VoteResponse>> {
    let session = session.ok_or(ApiError::SignInRequired)?;
    let caption_id = RecordId::new(caption_id);
    let bearer = Some(session.access_token.as_str());

    let has_existing_vote = state
        .data
        .list_votes(bearer, session.user.id)
        .await
        .map_err(|e| {
            error!("Failed to look up votes for user {}: {}", session.user.id, e);
            ApiError::Upstream(VOTE_FAILED.to_string())
        })?
        .iter()
        .any(|vote| vote.caption_id == caption_id);

    let upsert = VoteUpsert::new(
        session.user.id,
        caption_id.clone(),
        request.vote_value,
        has_existing_vote,
        Utc::now(),
    );

    state
        .data
        .upsert_vote(bearer, &upsert)
        .await
        .map_err(|e| match e {
            missing @ StoreError::NotFound(_) => ApiError::from(missing),
            other => {
                error!("Failed to record vote on {}: {}", caption_id, other);
                ApiError::Upstream(VOTE_FAILED.to_string())
            }
        })?;

    info!(
        "User {} voted {} on caption {}",
        session.user.id,
        request.vote_value.as_i16(),
        caption_id
    );

    Ok(Json(VoteResponse {
        caption_id,
        vote_value: request.vote_value,
        message: VOTE_RECORDED.to_string(),
    }))
}
