//! services/reader_api/src/bin/reader_api.rs

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::get,
    Router,
};
use quran_reader_core::AudioService;
use reader_api_lib::{
    adapters::{DbAdapter, LocalAudioAdapter},
    config::Config,
    error::ApiError,
    web::{
        active_khatam_handler, list_progress_handler,
        rest::ApiDoc,
        state::{AppState, AudioFactory},
        surah_progress_handler, ws_handler,
    },
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Audio ---
    let source_dir = config.audio_source_dir.clone();
    let cache_dir = config.audio_cache_dir.clone();
    let audio: AudioFactory = Arc::new(move || -> Arc<dyn AudioService> {
        Arc::new(LocalAudioAdapter::new(source_dir.clone(), cache_dir.clone()))
    });
    info!(
        "Audio is served from {} and cached in {}",
        config.audio_source_dir.display(),
        config.audio_cache_dir.display()
    );

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::from_store(
        db_adapter,
        audio,
        config.reader_settings(),
    ));

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // --- 5. Create the Web Router ---
    let api_router = Router::new()
        .route("/ws", get(ws_handler))
        .route("/progress", get(list_progress_handler))
        .route("/progress/{surah}", get(surah_progress_handler))
        .route("/khatam/active", get(active_khatam_handler))
        .layer(cors)
        .with_state(app_state);

    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
