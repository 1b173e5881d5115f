use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm::ProviderError;

/// Message returned to clients when provider details are withheld.
pub const MODEL_FAILURE_MESSAGE: &str = "Model request failed";

/// Error produced by a relay handler.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("request body must be a JSON object")]
    InvalidBody,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody | Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text placed in the `error` field of the response body.
    pub fn public_message(&self, expose_details: bool) -> String {
        match self {
            Self::Provider(_) if !expose_details => MODEL_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// A `RelayError` paired with the disclosure policy in force for the request.
pub struct ErrorResponse {
    pub error: RelayError,
    pub expose_details: bool,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.error.status();
        let body = Json(json!({ "error": self.error.public_message(self.expose_details) }));
        (status, body).into_response()
    }
}
