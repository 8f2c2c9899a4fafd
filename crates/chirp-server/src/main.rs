mod config;
mod seed;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use chirp_api::{AppState, AppStateInner};
use chirp_core::{FsMediaStore, Services};
use chirp_db::Database;

use crate::config::Config;

const MEDIA_ROUTE: &str = "/media";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chirp_server=debug,chirp_core=debug,chirp_api=debug,chirp_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Storage handles are owned here and lent to the services.
    let db = Arc::new(Database::open(&config.db_path)?);
    let media = Arc::new(FsMediaStore::new(config.media_dir.clone())?);
    let services = Services::new(db.clone(), media, config.services.clone());

    if config.seed {
        let (db, services) = (db.clone(), services.clone());
        tokio::task::spawn_blocking(move || seed::seed_if_empty(&db, &services)).await??;
    }

    let state: AppState = Arc::new(AppStateInner {
        services,
        media_url_prefix: MEDIA_ROUTE.to_string(),
        max_upload_bytes: config.services.max_media_bytes,
    });

    let app = Router::new()
        .merge(chirp_api::router(state))
        .nest_service(MEDIA_ROUTE, ServeDir::new(&config.media_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Chirp server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
