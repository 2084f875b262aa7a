//! Gallery endpoint: one page of images with search and sort applied

use axum::{
    Json,
    extract::{Query, State},
};
use common::{models::ImageRecord, store::RowRange};
use serde::{Deserialize, Serialize};
use tracing::error;
use views::{
    gallery::PAGE_SIZE,
    listing::{SortOption, filter_and_sort},
};

use crate::{
    error::{ApiError, ApiResult},
    middleware::RequestSession,
    state::AppState,
};

const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ImagesQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortOption,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImagePage {
    pub items: Vec<ImageRecord>,
    pub offset: usize,
    /// A full page came back, so another one may follow
    pub has_more: bool,
}

/// `GET /api/images?offset=&limit=&search=&sort=`
pub async fn list_images(
    State(state): State<AppState>,
    session: RequestSession,
    Query(query): Query<ImagesQuery>,
) -> ApiResult<Json<ImagePage>> {
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let range = RowRange::page(offset, limit)
        .ok_or_else(|| ApiError::BadRequest(format!("offset {offset} is out of range")))?;

    let rows = state
        .data
        .list_images(Some(&session.access_token), Some(range))
        .await
        .inspect_err(|e| error!("Failed to list images: {}", e))?;

    let has_more = rows.len() == limit;
    let items = filter_and_sort(&rows, query.search.as_deref().unwrap_or(""), query.sort);

    Ok(Json(ImagePage {
        items,
        offset,
        has_more,
    }))
}
