//! Headless view models for the caption gallery
//!
//! Each view is a plain state machine driven through `&mut self`. Requests
//! are split into a `begin_*` step that hands out what to fetch and a
//! `complete_*` step that applies the result, with async helpers that do both
//! against an injected [`common::store::DataApi`].

pub mod gallery;
pub mod lifecycle;
pub mod listing;
pub mod overlay;
pub mod session;
pub mod voting;

pub use gallery::GalleryView;
pub use session::SessionHandle;
pub use voting::VotingView;
