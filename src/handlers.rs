use axum::{extract::rejection::JsonRejection, Json};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::error::{ErrorResponse, RelayError};
use crate::prompts::{Operation, PromptRequest};
use crate::state::AppState;

pub const WELCOME_MESSAGE: &str = "Welcome to the Blackbox AI Backend API!";

/// Build the prompt for `operation`, call the model once, and wrap the completion.
pub async fn relay(
    state: &AppState,
    operation: Operation,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ErrorResponse> {
    let expose_details = state.config.expose_error_details;

    let result = run(state, operation, body).await;
    match result {
        Ok(text) => Ok(Json(json!({ "result": text }))),
        Err(err) => {
            match &err {
                RelayError::Provider(e) => error!("{} request failed: {}", operation.name(), e),
                other => warn!("Rejected {} request: {}", operation.name(), other),
            }
            Err(ErrorResponse {
                error: err,
                expose_details,
            })
        }
    }
}

async fn run(
    state: &AppState,
    operation: Operation,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<String, RelayError> {
    let Json(payload) = body.map_err(|rejection| {
        debug!("Body rejected: {}", rejection);
        RelayError::InvalidBody
    })?;

    let prompt = PromptRequest::from_payload(operation, &payload)?.render();
    debug!(
        "Handling {} with model {} ({} prompt chars)",
        operation.name(),
        state.model.model_name(),
        prompt.len()
    );

    let text = state.model.complete(&prompt).await?;
    Ok(text)
}
