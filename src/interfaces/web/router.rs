use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use super::AppState;
use super::handlers::{coordinator, jobs, templates};

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn build_api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/coordinator/start", post(coordinator::start))
        .route("/coordinator/continue", post(coordinator::continue_conversation))
        .route("/coordinator/ideas", post(coordinator::generate_ideas))
        .route("/coordinator/select", post(coordinator::select_idea))
        .route("/format/transform", post(coordinator::transform))
        .route(
            "/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/templates/{id}",
            get(templates::get_template).delete(templates::delete_template),
        )
        .route("/jobs", post(jobs::submit_job))
        .route("/jobs/{id}", get(jobs::get_job))
        .layer(build_cors())
        .with_state(state)
}
