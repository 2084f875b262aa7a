//! Custom error types for the common library
//!
//! This module defines the error taxonomy shared by the provider clients,
//! the view models and the web service.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Message shown when the hosted provider settings are missing.
pub const MISSING_SUPABASE_ENV: &str = "Missing Supabase env vars. Set SUPABASE_URL and SUPABASE_ANON_KEY. Example:\nSUPABASE_URL=https://your-project.supabase.co\nSUPABASE_ANON_KEY=your-anon-key";

/// Configuration errors. These are fatal: the process cannot serve requests
/// without a provider client.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or both of the required provider settings are absent or empty
    #[error("{}", MISSING_SUPABASE_ENV)]
    MissingSupabaseEnv,

    /// A setting is present but cannot be used
    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Errors raised by the Session Store (auth and data API)
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure talking to the provider
    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The auth endpoint rejected the request
    #[error("Auth error ({status}): {message}")]
    Auth { status: u16, message: String },

    /// The data API rejected the request
    #[error("Data API error ({status}): {message}")]
    Rest {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// A response body did not have the expected shape
    #[error("Unexpected provider response: {0}")]
    Decode(String),

    /// Error occurred during a direct database query
    #[error("Database query error: {0}")]
    Database(#[from] SqlxError),

    /// The referenced row does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// The request was refused before reaching the provider
    #[error("{0}")]
    Rejected(String),
}

impl StoreError {
    /// Whether the error means the caller's credentials are no longer valid
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            StoreError::Auth { status: 401 | 403, .. } | StoreError::Rest { status: 401, .. }
        )
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Custom error type for database setup
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
