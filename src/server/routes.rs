use std::path::PathBuf;

use axum::http::Method;
use axum::{routing::post, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{run_query, AppState};

pub fn create_router(log_dir: PathBuf) -> Router {
    let state = AppState { log_dir };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/query", post(run_query))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
