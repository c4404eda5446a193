//! GreenGen
//!
//! A community platform client for sustainable living: posts, communities,
//! challenges, and account management on top of a hosted backend.

mod client;
mod config;
mod errors;
mod flows;
mod models;
mod session;
mod shell;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use client::RemoteClient;
use config::Config;
use flows::{
    AccountFlow, ChallengeFlow, CommunityFlow, FeedFlow, ProfileFlow, SettingsFlow,
};
use session::SessionResolver;

/// Application state shared across the shell and all flows.
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Arc<RemoteClient>,
    pub session: Arc<SessionResolver>,
    pub account: AccountFlow,
    pub communities: CommunityFlow,
    pub challenges: ChallengeFlow,
    pub feed: FeedFlow,
    pub profile: ProfileFlow,
    pub settings: SettingsFlow,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let client = Arc::new(RemoteClient::new(&config));
        let session = Arc::new(SessionResolver::new(Arc::clone(&client)));

        Self {
            config: Arc::new(config),
            account: AccountFlow::new(Arc::clone(&client), Arc::clone(&session)),
            communities: CommunityFlow::new(Arc::clone(&client), Arc::clone(&session)),
            challenges: ChallengeFlow::new(Arc::clone(&client), Arc::clone(&session)),
            feed: FeedFlow::new(Arc::clone(&client), Arc::clone(&session)),
            profile: ProfileFlow::new(Arc::clone(&client), Arc::clone(&session)),
            settings: SettingsFlow::new(Arc::clone(&client), Arc::clone(&session)),
            client,
            session,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting GreenGen");
    tracing::info!("Backend URL: {}", config.backend_url);
    tracing::info!("Storage bucket: {}", config.storage_bucket);

    if config.backend_url.is_empty() || config.anon_key.is_empty() {
        tracing::warn!(
            "Backend not configured (GREENGEN_SUPABASE_URL / GREENGEN_SUPABASE_ANON_KEY). \
             Remote calls will fail."
        );
    }

    let state = AppState::new(config);
    let _watcher = state.session.spawn_watcher();

    shell::run(&state).await?;

    Ok(())
}

#[cfg(test)]
mod tests;
