use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::ErrorResponse;
use crate::handlers::{relay, WELCOME_MESSAGE};
use crate::prompts::Operation;
use crate::state::AppState;

type RelayResult = Result<Json<Value>, ErrorResponse>;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/api/health", get(health_check))
        .route("/api/generate-code", post(generate_code))
        .route("/api/debug", post(debug_code))
        .route("/api/explain", post(explain_code))
        .route("/api/convert-code", post(convert_code))
        // All review mounts share one operation.
        .route("/review", post(review_code))
        .route("/grokreview", post(review_code))
        .route("/api/review", post(review_code))
        .route("/api/grokreview", post(review_code))
}

/// Full application: routes, permissive CORS and request tracing.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn welcome() -> &'static str {
    WELCOME_MESSAGE
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.model.model_name(),
    }))
}

async fn generate_code(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> RelayResult {
    relay(&state, Operation::Generate, body).await
}

async fn debug_code(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> RelayResult {
    relay(&state, Operation::Debug, body).await
}

async fn explain_code(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> RelayResult {
    relay(&state, Operation::Explain, body).await
}

async fn convert_code(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> RelayResult {
    relay(&state, Operation::Convert, body).await
}

async fn review_code(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> RelayResult {
    relay(&state, Operation::Review, body).await
}
