//! Caption repository for database operations

use common::{
    error::StoreResult,
    models::{CaptionRecord, RecordId},
    store::CaptionOrder,
};
use sqlx::{PgPool, Row};

/// Caption repository for database operations
#[derive(Clone)]
pub struct CaptionRepository {
    pool: PgPool,
}

impl CaptionRepository {
    /// Create a new caption repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All captions in the requested order. Fails when the ordering column
    /// does not exist.
    pub async fn list(&self, order: CaptionOrder) -> StoreResult<Vec<CaptionRecord>> {
        let sql = match order {
            CaptionOrder::NewestFirst => {
                r#"
                SELECT id::text AS id, content, image_id::text AS image_id
                FROM captions
                ORDER BY created_datetime_utc DESC
                "#
            }
            CaptionOrder::IdDescending => {
                r#"
                SELECT id::text AS id, content, image_id::text AS image_id
                FROM captions
                ORDER BY id DESC
                "#
            }
        };

        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;

        let captions = rows
            .into_iter()
            .map(|row| CaptionRecord {
                id: RecordId::new(row.get::<String, _>("id")),
                content: row.get("content"),
                image_id: row
                    .get::<Option<String>, _>("image_id")
                    .map(RecordId::new),
            })
            .collect();

        Ok(captions)
    }
}
