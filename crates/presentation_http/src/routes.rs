//! Route definitions

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    handlers,
    middleware::{RateLimiterConfig, RateLimiterLayer, request_id},
    state::AppState,
};

/// Create the main router with all routes and the shared middleware
pub fn create_router(state: AppState) -> Router {
    let rate_limiter = RateLimiterLayer::with_state(
        &RateLimiterConfig {
            requests_per_minute: state.config.server.auth_rate_limit_rpm,
            ..RateLimiterConfig::default()
        },
        Arc::clone(&state.auth_limiter),
    );
    let max_body_bytes = state.config.server.max_body_bytes;

    Router::new()
        // Health
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        // Authentication
        .route("/v1/auth/login", post(handlers::auth::login))
        .route("/v1/auth/directory", post(handlers::auth::directory_login))
        .route("/v1/auth/signup", post(handlers::auth::signup))
        .route("/v1/auth/logout", post(handlers::auth::logout))
        .route("/v1/auth/session", get(handlers::auth::current_session))
        .route("/v1/auth/password", post(handlers::auth::change_password))
        // Practice
        .route("/v1/scenarios", get(handlers::scenarios::list))
        .route("/v1/conversation/start", post(handlers::conversation::start))
        .route("/v1/conversation/message", post(handlers::conversation::message))
        .route("/v1/conversation/choices", get(handlers::conversation::choices))
        // Voice
        .route("/v1/transcription/final", get(handlers::voice::final_transcript))
        .route("/v1/transcription/partial", get(handlers::voice::partial_transcript))
        .route("/v1/speech", post(handlers::voice::speak))
        .route("/_tts", get(handlers::voice::tts_placeholder))
        // Roster
        .route("/v1/roster/users", get(handlers::roster::users))
        .route("/v1/roster/therapists", get(handlers::roster::therapists))
        .route("/v1/roster/patients", post(handlers::roster::create_patient))
        .route(
            "/v1/roster/therapists/{username}/patients",
            get(handlers::roster::patients),
        )
        .route("/v1/roster/activity/{username}", get(handlers::roster::activity))
        .layer(rate_limiter)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}
