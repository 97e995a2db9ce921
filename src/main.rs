use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chathub::{
    api,
    config::Config,
    heartbeat,
    hub::Hub,
    store::{ChatStore, SupabaseStore},
    ws,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chathub=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting chathub...");

    let config = Config::from_env();

    // Initialize the durable store
    let store: Option<Arc<dyn ChatStore>> = match config.supabase() {
        Some((url, key)) => {
            tracing::info!("Supabase persistence enabled");
            Some(Arc::new(SupabaseStore::new(
                url.to_string(),
                key.to_string(),
            )))
        }
        None => {
            tracing::warn!("Supabase not configured. Chat messages will not be persisted.");
            None
        }
    };

    let hub = Arc::new(Hub::new(store));

    // Spawn background task broadcasting the online count every second
    heartbeat::spawn_presence_heartbeat(hub.clone());

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/healthz", get(api::healthz))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(hub);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
