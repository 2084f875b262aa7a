//! Client-side search and sort over a fetched page of images

use common::models::ImageRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Sort options offered by the gallery toolbar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOption {
    /// Fetch order, newest id first
    #[default]
    Newest,
    Az,
    Za,
}

/// Whether the image's description contains `query`, ignoring case and
/// surrounding whitespace. An empty query matches everything.
pub fn matches(image: &ImageRecord, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    needle.is_empty() || image.description().to_lowercase().contains(&needle)
}

/// Decomposed, lower-cased letters with accents stripped
fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Decomposed, lower-cased letters with accents kept
fn accented_letters(s: &str) -> String {
    s.nfd().flat_map(char::to_lowercase).collect()
}

/// Locale-style comparison in three levels: base letters, then accents
/// (unaccented first), then case (lower before upper at the first
/// differing character).
pub fn compare_descriptions(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| accented_letters(a).cmp(&accented_letters(b)))
        .then_with(|| {
            a.nfd()
                .zip(b.nfd())
                .find(|(x, y)| x != y)
                .map(|(x, y)| match (x.is_lowercase(), y.is_lowercase()) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => x.cmp(&y),
                })
                .unwrap_or(Ordering::Equal)
        })
}

/// Filter `items` by `query` and order them by `sort`. Sorting is stable, so
/// equal descriptions keep their fetch order.
pub fn filter_and_sort(items: &[ImageRecord], query: &str, sort: SortOption) -> Vec<ImageRecord> {
    let mut visible: Vec<ImageRecord> = items
        .iter()
        .filter(|image| matches(image, query))
        .cloned()
        .collect();

    match sort {
        SortOption::Newest => {}
        SortOption::Az => {
            visible.sort_by(|a, b| compare_descriptions(a.description(), b.description()))
        }
        SortOption::Za => {
            visible.sort_by(|a, b| compare_descriptions(b.description(), a.description()))
        }
    }

    visible
}
