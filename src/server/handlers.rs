use super::AppState;
use crate::answers::{classify_json, AnswerError};
use crate::features::InputError;
use crate::models::{PredictionFailure, PredictionOutcome};
use crate::predictor::respond;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn body_text(body: &Bytes) -> Result<&str, InputError> {
    std::str::from_utf8(body).map_err(InputError::NotUtf8)
}

/// POST /predict
///
/// The body is read raw so malformed JSON still gets the structured
/// failure object rather than axum's plain-text rejection.
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<PredictionOutcome>) {
    let outcome = match body_text(&body) {
        Ok(input) => respond(state.predictor.as_ref(), input),
        Err(e) => PredictionOutcome::Failure(PredictionFailure::new(e.to_string())),
    };
    let status = if outcome.is_failure() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    (status, Json(outcome))
}

/// POST /classify
pub async fn classify(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<ErrorResponse>)> {
    let classifier = state.answers.as_ref().ok_or_else(|| {
        error(
            StatusCode::SERVICE_UNAVAILABLE,
            "No answer model is configured",
        )
    })?;

    let result = body_text(&body)
        .map_err(AnswerError::from)
        .and_then(|input| classify_json(classifier, input));
    match result {
        Ok(prediction) => Ok(Json(json!({ "label": prediction.label }))),
        Err(e) => {
            tracing::warn!("Rejected classification input: {}", e);
            Err(error(StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "predictor": state.predictor.name(),
    }))
}
