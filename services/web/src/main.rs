use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod auth;
mod captions;
mod config;
mod error;
mod gallery;
mod middleware;
mod repositories;
mod routes;
mod state;
#[cfg(test)]
mod tests;

use common::{
    claims::TokenVerifier,
    config::SupabaseConfig,
    database::{DatabaseConfig, health_check, init_pool},
    store::DataApi,
    supabase::SupabaseClient,
};

use crate::{config::WebConfig, repositories::PgDataStore, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting web service");

    let settings = WebConfig::load()?;
    let supabase_config = SupabaseConfig::from_env()?;

    let verifier = supabase_config
        .jwt_secret
        .as_deref()
        .map(TokenVerifier::from_secret);
    if verifier.is_none() {
        warn!("SUPABASE_JWT_SECRET not set, access tokens are checked with the provider");
    }

    let client = Arc::new(SupabaseClient::new(supabase_config)?);

    // Direct database access is optional
    let data: Arc<dyn DataApi> = match DatabaseConfig::from_env() {
        Some(db_config) => {
            let pool = init_pool(&db_config).await?;
            if health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }
            Arc::new(PgDataStore::new(pool))
        }
        None => client.clone() as Arc<dyn DataApi>,
    };

    let app_state = AppState {
        auth: client,
        data,
        verifier,
        settings: Arc::new(settings.clone()),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!("Web service listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
