//! Data API: images, captions and caption votes

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};
use uuid::Uuid;

use super::{Api, SupabaseClient, send_empty, send_json};
use crate::{
    error::StoreResult,
    models::{CaptionRecord, ImageRecord, RecordId, VoteUpsert, VoteValue},
    store::{CaptionOrder, CaptionVote, DataApi, RowRange},
};

const IMAGES: &str = "images";
const CAPTIONS: &str = "captions";
const CAPTION_VOTES: &str = "caption_votes";

/// Conflict target of the vote upsert
pub const VOTE_CONFLICT_TARGET: &str = "profile_id,caption_id";

#[derive(Debug, Deserialize)]
struct VoteRow {
    caption_id: Option<RecordId>,
    vote_value: Option<i16>,
}

impl SupabaseClient {
    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.config.rest_url(), table)
    }
}

#[async_trait]
impl DataApi for SupabaseClient {
    async fn list_images(
        &self,
        bearer: Option<&str>,
        range: Option<RowRange>,
    ) -> StoreResult<Vec<ImageRecord>> {
        let mut request = self.http.get(self.table_url(IMAGES)).query(&[
            ("select", "id,url,image_description"),
            ("order", "id.desc"),
        ]);

        if let Some(range) = range {
            request = request.query(&[
                ("offset", range.from.to_string()),
                ("limit", range.len().to_string()),
            ]);
        }

        send_json(Api::Rest, self.authorized(request, bearer)).await
    }

    async fn list_captions(
        &self,
        bearer: Option<&str>,
        order: CaptionOrder,
    ) -> StoreResult<Vec<CaptionRecord>> {
        let order = format!("{}.desc", order.column());
        let request = self
            .http
            .get(self.table_url(CAPTIONS))
            .query(&[("select", "id,content,image_id"), ("order", order.as_str())]);

        send_json(Api::Rest, self.authorized(request, bearer)).await
    }

    async fn list_votes(
        &self,
        bearer: Option<&str>,
        profile_id: Uuid,
    ) -> StoreResult<Vec<CaptionVote>> {
        let filter = format!("eq.{profile_id}");
        let request = self.http.get(self.table_url(CAPTION_VOTES)).query(&[
            ("select", "caption_id,vote_value"),
            ("profile_id", filter.as_str()),
        ]);

        let rows: Vec<VoteRow> = send_json(Api::Rest, self.authorized(request, bearer)).await?;

        let votes = rows
            .into_iter()
            .filter_map(|row| {
                let caption_id = row.caption_id?;
                match row.vote_value.map(VoteValue::try_from) {
                    Some(Ok(vote_value)) => Some(CaptionVote {
                        caption_id,
                        vote_value,
                    }),
                    _ => {
                        debug!("Skipping vote row without a usable value for {}", caption_id);
                        None
                    }
                }
            })
            .collect();

        Ok(votes)
    }

    async fn upsert_vote(&self, bearer: Option<&str>, vote: &VoteUpsert) -> StoreResult<()> {
        let request = self
            .http
            .post(self.table_url(CAPTION_VOTES))
            .query(&[("on_conflict", VOTE_CONFLICT_TARGET)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(vote);

        send_empty(Api::Rest, self.authorized(request, bearer))
            .await
            .inspect_err(|e| error!("Vote upsert failed for {}: {}", vote.caption_id, e))
    }
}
