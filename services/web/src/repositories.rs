//! Repositories for direct database access
//!
//! Used instead of the data API when `DATABASE_URL` is configured. Queries
//! run with the service's own database role, so row-level policies of the
//! data API do not apply and the bearer token is ignored.

use async_trait::async_trait;
use common::{
    error::StoreResult,
    models::{CaptionRecord, ImageRecord, VoteUpsert},
    store::{CaptionOrder, CaptionVote, DataApi, RowRange},
};
use sqlx::PgPool;
use uuid::Uuid;

pub mod captions;
pub mod images;
pub mod votes;

use self::{captions::CaptionRepository, images::ImageRepository, votes::VoteRepository};

/// `DataApi` backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgDataStore {
    images: ImageRepository,
    captions: CaptionRepository,
    votes: VoteRepository,
}

impl PgDataStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            images: ImageRepository::new(pool.clone()),
            captions: CaptionRepository::new(pool.clone()),
            votes: VoteRepository::new(pool),
        }
    }
}

#[async_trait]
impl DataApi for PgDataStore {
    async fn list_images(
        &self,
        _bearer: Option<&str>,
        range: Option<RowRange>,
    ) -> StoreResult<Vec<ImageRecord>> {
        self.images.list(range).await
    }

    async fn list_captions(
        &self,
        _bearer: Option<&str>,
        order: CaptionOrder,
    ) -> StoreResult<Vec<CaptionRecord>> {
        self.captions.list(order).await
    }

    async fn list_votes(
        &self,
        _bearer: Option<&str>,
        profile_id: Uuid,
    ) -> StoreResult<Vec<CaptionVote>> {
        self.votes.list_for_profile(profile_id).await
    }

    async fn upsert_vote(&self, _bearer: Option<&str>, vote: &VoteUpsert) -> StoreResult<()> {
        self.votes.upsert(vote).await
    }
}
