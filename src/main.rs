use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use crate::config::Config;
use crate::controller::AppState;
use crate::models::session::validate_credential;
use crate::repositories::google_maps_repo::GoogleMapsRepo;
use crate::repositories::session_repo::SessionRepo;

pub mod config;
pub mod controller;
pub mod error;
pub mod helpers;
pub mod models;
pub mod repositories;
pub mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::parse();
    info!("Starting restaurant discovery in {} mode", config.environment);

    let maps_repo = GoogleMapsRepo::new(
        &config.maps_base_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let default_key = config
        .google_maps_api_key
        .as_deref()
        .map(validate_credential)
        .transpose()
        .context("Configured Google Maps API key is malformed")?;
    if default_key.is_none() {
        info!("No default Google Maps API key configured, sessions must supply their own");
    }

    let app_state = AppState {
        maps_provider: Arc::new(maps_repo),
        session_repo: Arc::new(SessionRepo::new(
            default_key,
            Duration::from_secs(config.session_idle_secs),
        )),
    };

    controller::serve(app_state, &config).await
}
