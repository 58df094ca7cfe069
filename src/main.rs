// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use mocktest::config::Config;
use mocktest::models::user::ROLE_ADMIN;
use mocktest::routes;
use mocktest::state::AppState;
use mocktest::store::{QuizStore, SqliteStore};
use sqlx::sqlite::SqlitePoolOptions;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .expect("Failed to open the database");

    tracing::info!("Database connected...");

    let store = SqliteStore::new(pool);

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    store
        .migrate()
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    // Seed Admin User
    if let Some(username) = &config.admin_username {
        match store.ensure_user(username, "Administrator", ROLE_ADMIN).await {
            Ok(user) => tracing::info!("Admin user '{}' has id {}", user.username, user.id),
            Err(e) => tracing::error!("Failed to seed admin user: {:?}", e),
        }
    }

    let store: Arc<dyn QuizStore> = Arc::new(store);
    let state = AppState::new(store, config.clone());

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listening address");
    tracing::info!("Listening on {}", config.bind_addr);

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}
