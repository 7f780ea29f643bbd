//! User Tags - HTTP server
//!
//! ## Endpoints
//!
//! - `GET /v1/user-tags` - List tags with entry counts
//! - `POST /v1/user-tags` - Create tag
//! - `GET /v1/user-tags/:id` - Get tag
//! - `PUT /v1/user-tags/:id` - Rename tag
//! - `DELETE /v1/user-tags/:id` - Delete tag and its associations
//! - `GET /v1/user-tags/:id/entries` - Entries carrying a tag
//! - `GET /v1/entries/:id/user-tags` - Tag IDs of an entry
//! - `PUT /v1/entries/:id/user-tags` - Replace the tags of an entry
//! - `GET /healthz` - Health check

use anyhow::Context;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_tags::{handlers, AppState, Config, DbContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "user_tags=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let bind_addr = config.bind_addr();

    info!("Starting user tag service");
    info!("Database: {}", config.db.database_url);

    let pool = config
        .db
        .connect()
        .await
        .context("failed to open database")?;
    let db = DbContext::new(pool);
    db.migrate().await.context("failed to migrate database")?;

    let state = AppState::new(db);

    let app = handlers::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any)),
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;

    info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
