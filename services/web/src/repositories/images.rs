//! Image repository for database operations

use common::{
    error::{StoreError, StoreResult},
    models::{ImageRecord, RecordId},
    store::RowRange,
};
use sqlx::{PgPool, Row, postgres::PgRow};

/// Image repository for database operations
#[derive(Clone)]
pub struct ImageRepository {
    pool: PgPool,
}

fn image_from_row(row: PgRow) -> ImageRecord {
    ImageRecord {
        id: RecordId::new(row.get::<String, _>("id")),
        url: row.get("url"),
        image_description: row.get("image_description"),
    }
}

impl ImageRepository {
    /// Create a new image repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Images newest id first, optionally restricted to a window
    pub async fn list(&self, range: Option<RowRange>) -> StoreResult<Vec<ImageRecord>> {
        let (limit, offset) = match range {
            Some(range) => {
                let offset = i64::try_from(range.from).map_err(|_| {
                    StoreError::Rejected(format!("offset {} is out of range", range.from))
                })?;
                (Some(range.len() as i64), offset)
            }
            None => (None, 0),
        };

        let rows = sqlx::query(
            r#"
            SELECT id::text AS id, url, image_description
            FROM images
            WHERE url IS NOT NULL
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(image_from_row).collect())
    }
}
