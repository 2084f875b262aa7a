//! Common library for the caption gallery
//!
//! This crate provides the pieces shared by the view models and the web
//! service: the records exchanged with the hosted provider, the Session Store
//! traits and their HTTP client, access-token verification, configuration and
//! the error taxonomy.
//!
//! ```rust,no_run
//! use common::config::SupabaseConfig;
//! use common::store::DataApi;
//! use common::supabase::SupabaseClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SupabaseClient::new(SupabaseConfig::from_env()?)?;
//!     let images = client.list_images(None, None).await?;
//!     println!("{} images", images.len());
//!     Ok(())
//! }
//! ```

pub mod claims;
pub mod config;
pub mod database;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod models;
pub mod store;
pub mod supabase;

pub use supabase::SupabaseClient;
