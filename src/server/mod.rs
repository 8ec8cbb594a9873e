mod handlers;
mod routes;

pub use routes::create_router;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Config;
use crate::passport::PassportClient;
use crate::store::Store;
use crate::webhook::WebhookReceiver;

/// Shared application state
pub struct AppState {
    pub store: Store,
    pub passport: PassportClient,
    pub receiver: WebhookReceiver,
    pub default_scopes: Vec<String>,
}

impl AppState {
    pub fn new(store: Store, config: &Config) -> Result<Self> {
        let passport = PassportClient::new(config.passport.clone(), &config.http)?;
        let receiver = WebhookReceiver::new(config.webhook.clone());
        Ok(Self {
            store,
            passport,
            receiver,
            default_scopes: config.passport.default_scopes.clone(),
        })
    }
}

/// Run the webhook and auth callback server
pub async fn run_server(addr: SocketAddr, db_path: &str, config: &Config) -> Result<()> {
    let store = Store::open(db_path)?;
    let state = Arc::new(AppState::new(store, config)?);
    let app = create_router(state);

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
