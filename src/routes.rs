// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, analysis, attempt},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Attempt and analysis routes require a valid bearer token.
/// * Admin routes additionally require the 'admin' role.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let attempt_routes = Router::new()
        .route("/", post(attempt::start_attempt))
        .route(
            "/current",
            get(attempt::get_current).delete(attempt::abandon_attempt),
        )
        .route("/current/answers", put(attempt::record_answer))
        .route("/current/submit", post(attempt::submit_attempt))
        .route("/{id}/score", get(attempt::get_attempt_score));

    let me_routes = Router::new().route("/analysis", get(analysis::my_analysis));

    let admin_routes = Router::new()
        .route("/students", get(admin::list_students))
        .route("/students/{id}/report", get(admin::student_report))
        .route("/results", get(admin::export_results))
        .route("/questions", post(admin::create_question))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware));

    let protected = Router::new()
        .nest("/api/attempts", attempt_routes)
        .nest("/api/me", me_routes)
        .nest("/api/admin", admin_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
