//! Gallery Data View
//!
//! Paginated image listing with client-side search and sort. The initial
//! load and pagination are tracked separately: `Phase` covers the first page
//! and errors, `Pager` the single in-flight "load more" request.

use common::{
    error::StoreResult,
    models::{ImageRecord, RecordId},
    store::{DataApi, RowRange},
};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{error, info};

use crate::lifecycle::{Lifecycle, LoadTicket};
use crate::listing::{SortOption, filter_and_sort};
use crate::overlay::DetailOverlay;

pub const PAGE_SIZE: usize = 20;

/// How long appended items stay tagged as new
pub const FRESH_FOR: Duration = Duration::from_millis(650);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Error(String),
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pager {
    Idle,
    LoadingMore,
}

/// A page the view wants fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub ticket: LoadTicket,
    pub range: RowRange,
}

#[derive(Debug)]
pub struct GalleryView<F = String> {
    items: Vec<ImageRecord>,
    phase: Phase,
    pager: Pager,
    has_more: bool,
    query: String,
    sort: SortOption,
    fresh: HashSet<RecordId>,
    fresh_until: Option<Instant>,
    lifecycle: Lifecycle,
    pub overlay: DetailOverlay<F>,
}

impl<F> Default for GalleryView<F> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            phase: Phase::Loading,
            pager: Pager::Idle,
            has_more: true,
            query: String::new(),
            sort: SortOption::default(),
            fresh: HashSet::new(),
            fresh_until: None,
            lifecycle: Lifecycle::default(),
            overlay: DetailOverlay::default(),
        }
    }
}

impl<F: Clone + PartialEq> GalleryView<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn pager(&self) -> Pager {
        self.pager
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Every fetched image in fetch order
    pub fn items(&self) -> &[ImageRecord] {
        &self.items
    }

    /// Fetched images after search and sort
    pub fn visible(&self) -> Vec<ImageRecord> {
        filter_and_sort(&self.items, &self.query, self.sort)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn sort(&self) -> SortOption {
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort = sort;
    }

    pub fn reset_filters(&mut self) {
        self.query.clear();
        self.sort = SortOption::Newest;
    }

    /// Start the first page load
    pub fn begin_initial_load(&mut self) -> PageRequest {
        self.phase = Phase::Loading;
        PageRequest {
            ticket: self.lifecycle.issue(),
            range: RowRange::first(PAGE_SIZE),
        }
    }

    /// Apply the first page. Returns false when the result was stale.
    pub fn complete_initial_load(
        &mut self,
        ticket: LoadTicket,
        result: StoreResult<Vec<ImageRecord>>,
    ) -> bool {
        if !self.lifecycle.accepts(ticket) {
            return false;
        }

        match result {
            Ok(rows) => {
                self.has_more = rows.len() == PAGE_SIZE;
                self.items = rows;
                self.phase = Phase::Ready;
            }
            Err(e) => {
                error!("Failed to load images: {}", e);
                self.items.clear();
                self.has_more = false;
                self.phase = Phase::Error(e.to_string());
            }
        }
        true
    }

    /// Request the next contiguous page, unless a load is already running or
    /// the last page came back short
    pub fn begin_load_more(&mut self) -> Option<PageRequest> {
        if self.phase == Phase::Loading || self.pager == Pager::LoadingMore || !self.has_more {
            return None;
        }

        let range = RowRange::page(self.items.len(), PAGE_SIZE)?;
        self.pager = Pager::LoadingMore;
        Some(PageRequest {
            ticket: self.lifecycle.issue(),
            range,
        })
    }

    pub fn complete_load_more(
        &mut self,
        ticket: LoadTicket,
        result: StoreResult<Vec<ImageRecord>>,
        now: Instant,
    ) -> bool {
        if !self.lifecycle.accepts(ticket) {
            return false;
        }

        self.pager = Pager::Idle;
        match result {
            Ok(rows) => {
                self.has_more = rows.len() == PAGE_SIZE;
                self.fresh = rows.iter().map(|image| image.id.clone()).collect();
                self.fresh_until = Some(now + FRESH_FOR);
                info!("Appended {} images", rows.len());
                self.items.extend(rows);
            }
            Err(e) => {
                error!("Failed to load more images: {}", e);
                self.phase = Phase::Error(e.to_string());
            }
        }
        true
    }

    /// Whether `id` arrived with the most recent page and is still tagged new
    pub fn is_fresh(&self, id: &RecordId) -> bool {
        self.fresh.contains(id)
    }

    /// Drop the "new" tags once their time is up
    pub fn expire_fresh(&mut self, now: Instant) {
        if self.fresh_until.is_some_and(|until| now >= until) {
            self.fresh.clear();
            self.fresh_until = None;
        }
    }

    /// Forget outstanding requests; their results will be ignored
    pub fn unmount(&mut self) {
        self.lifecycle.invalidate();
        self.pager = Pager::Idle;
    }

    pub async fn load_initial(&mut self, data: &dyn DataApi, bearer: Option<&str>) {
        let request = self.begin_initial_load();
        let result = data.list_images(bearer, Some(request.range)).await;
        self.complete_initial_load(request.ticket, result);
    }

    pub async fn load_more(&mut self, data: &dyn DataApi, bearer: Option<&str>) -> bool {
        let Some(request) = self.begin_load_more() else {
            return false;
        };
        let result = data.list_images(bearer, Some(request.range)).await;
        self.complete_load_more(request.ticket, result, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::memory::{Failure, MemoryStore};

    async fn store_with(count: i64) -> MemoryStore {
        let store = MemoryStore::new();
        for id in 1..=count {
            store
                .add_image(ImageRecord {
                    id: RecordId::from(id),
                    url: format!("https://cdn/{id}.png"),
                    image_description: Some(format!("image {id}")),
                })
                .await;
        }
        store
    }

    #[tokio::test]
    async fn full_first_page_enables_load_more() {
        let store = store_with(45).await;
        let mut view: GalleryView = GalleryView::new();

        view.load_initial(&store, None).await;
        assert_eq!(view.phase(), &Phase::Ready);
        assert_eq!(view.items().len(), PAGE_SIZE);
        assert_eq!(view.items()[0].id, RecordId::from(45));
        assert!(view.has_more());

        let request = view.begin_load_more().unwrap();
        assert_eq!(Some(request.range), RowRange::page(20, PAGE_SIZE));
        assert!(view.begin_load_more().is_none());
    }

    #[tokio::test]
    async fn short_page_disables_load_more() {
        let store = store_with(7).await;
        let mut view: GalleryView = GalleryView::new();

        view.load_initial(&store, None).await;
        assert_eq!(view.items().len(), 7);
        assert!(!view.has_more());
        assert!(view.begin_load_more().is_none());
    }

    #[tokio::test]
    async fn load_more_appends_and_tags_new_items() {
        let store = store_with(25).await;
        let mut view: GalleryView = GalleryView::new();
        view.load_initial(&store, None).await;

        let request = view.begin_load_more().unwrap();
        let rows = store.list_images(None, Some(request.range)).await;
        let now = Instant::now();
        assert!(view.complete_load_more(request.ticket, rows, now));

        assert_eq!(view.items().len(), 25);
        assert!(!view.has_more());
        assert_eq!(view.pager(), Pager::Idle);
        assert!(view.is_fresh(&RecordId::from(5)));
        assert!(!view.is_fresh(&RecordId::from(25)));

        view.expire_fresh(now + Duration::from_millis(100));
        assert!(view.is_fresh(&RecordId::from(5)));
        view.expire_fresh(now + FRESH_FOR);
        assert!(!view.is_fresh(&RecordId::from(5)));
    }

    #[tokio::test]
    async fn load_more_failure_surfaces_error() {
        let store = store_with(40).await;
        let mut view: GalleryView = GalleryView::new();
        view.load_initial(&store, None).await;

        store.fail(Failure::ListImages).await;
        assert!(view.load_more(&store, None).await);
        assert!(matches!(view.phase(), Phase::Error(_)));
        assert_eq!(view.pager(), Pager::Idle);
        assert_eq!(view.items().len(), PAGE_SIZE);
    }

    #[tokio::test]
    async fn initial_failure_shows_error() {
        let store = store_with(3).await;
        store.fail(Failure::ListImages).await;
        let mut view: GalleryView = GalleryView::new();

        view.load_initial(&store, None).await;
        assert!(matches!(view.phase(), Phase::Error(_)));
        assert!(view.items().is_empty());
    }

    #[tokio::test]
    async fn results_after_unmount_are_dropped() {
        let store = store_with(3).await;
        let mut view: GalleryView = GalleryView::new();

        let request = view.begin_initial_load();
        view.unmount();
        let rows = store.list_images(None, Some(request.range)).await;
        assert!(!view.complete_initial_load(request.ticket, rows));
        assert_eq!(view.phase(), &Phase::Loading);
    }

    #[test]
    fn reset_filters_restores_defaults() {
        let mut view: GalleryView = GalleryView::new();
        view.set_query("cat");
        view.set_sort(SortOption::Za);

        view.reset_filters();
        assert_eq!(view.query(), "");
        assert_eq!(view.sort(), SortOption::Newest);
    }
}
