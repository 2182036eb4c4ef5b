//! services/api/src/bin/api.rs

use api_lib::{
    adapters::db::DbAdapter,
    config::Config,
    error::ApiError,
    web::{
        admin_report_handler, admin_reset_handler, checkin_handler, dashboard_handler,
        leaderboard_handler, middleware::require_admin, register_handler, rest::ApiDoc,
        state::AppState,
    },
};
use axum::{
    http::{
        header::{HeaderName, ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
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
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store: db_adapter,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Config(api_lib::config::ConfigError::InvalidValue(
                    "CORS_ORIGIN".to_string(),
                    e.to_string(),
                )))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT, HeaderName::from_static("x-admin-key")]);

    // --- 4. Create the Web Router ---
    // Public routes (students and the leaderboard).
    let public_routes = Router::new()
        .route("/students", post(register_handler))
        .route("/students/{id}", get(dashboard_handler))
        .route("/students/{id}/checkin", post(checkin_handler))
        .route("/leaderboard", get(leaderboard_handler));

    // Admin routes (shared-passphrase gated).
    let admin_routes = Router::new()
        .route("/admin/report", get(admin_report_handler))
        .route("/admin/reset", post(admin_reset_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_admin,
        ));

    // Combine API routes.
    let api_router = Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
