//! Caption vote repository for database operations

use common::{
    error::{StoreError, StoreResult},
    models::{RecordId, VoteUpsert, VoteValue},
    store::CaptionVote,
};
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

/// Caption vote repository for database operations
#[derive(Clone)]
pub struct VoteRepository {
    pool: PgPool,
}

impl VoteRepository {
    /// Create a new vote repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every vote cast by a profile
    pub async fn list_for_profile(&self, profile_id: Uuid) -> StoreResult<Vec<CaptionVote>> {
        let rows = sqlx::query(
            r#"
            SELECT caption_id::text AS caption_id, vote_value::smallint AS vote_value
            FROM caption_votes
            WHERE profile_id = $1
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        let votes = rows
            .into_iter()
            .filter_map(|row| {
                let caption_id = RecordId::new(row.get::<String, _>("caption_id"));
                let raw: i16 = row.get("vote_value");
                match VoteValue::try_from(raw) {
                    Ok(vote_value) => Some(CaptionVote {
                        caption_id,
                        vote_value,
                    }),
                    Err(reason) => {
                        debug!("Skipping vote on {}: {}", caption_id, reason);
                        None
                    }
                }
            })
            .collect();

        Ok(votes)
    }

    /// Insert or overwrite the vote for `(profile_id, caption_id)`
    pub async fn upsert(&self, vote: &VoteUpsert) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO caption_votes
                (profile_id, caption_id, vote_value, created_datetime_utc, modified_datetime_utc)
            SELECT $1, c.id, $3, $4, $5
            FROM captions c
            WHERE c.id::text = $2
            ON CONFLICT (profile_id, caption_id) DO UPDATE
            SET vote_value = EXCLUDED.vote_value,
                modified_datetime_utc = COALESCE(EXCLUDED.modified_datetime_utc, now())
            "#,
        )
        .bind(vote.profile_id)
        .bind(vote.caption_id.as_str())
        .bind(vote.vote_value.as_i16())
        .bind(vote.created_datetime_utc)
        .bind(vote.modified_datetime_utc)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("caption {}", vote.caption_id)));
        }

        Ok(())
    }
}
