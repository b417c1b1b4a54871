//! Route table

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::websocket;

/// Prefix of every API route
pub const API_PREFIX: &str = "/api/v1";

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/login/token", post(handlers::login_token))
        .route("/login/jwt", post(handlers::login_jwt))
        .route("/claims/token", post(handlers::claims_token))
        .route("/claims/add", post(handlers::claims_add))
        .route("/claims", get(handlers::claims_list))
        .route("/attestations/add", post(handlers::attestations_add))
        .route("/attestations", post(handlers::attestations_get))
        .route("/authorizations/token", post(handlers::authorizations_token))
        .route("/authorizations/jwt", post(handlers::authorizations_jwt))
        .route("/users/add", post(handlers::users_add))
        .route("/socket", get(websocket::websocket_handler));

    Router::new()
        .nest(API_PREFIX, api)
        .route("/health", get(handlers::health))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
