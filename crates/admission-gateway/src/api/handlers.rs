use std::sync::Arc;

use axum::{
    body::Body,
    extract,
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio::{task, time::Instant};
use tracing::{Span, error, info, warn};

use crate::{
    api::{api_error::ApiError, state::ApiServerState},
    engine::{
        ReviewOutcome,
        errors::{AdmissionError, Result},
    },
};

pub(crate) const REQUEST_ID_HEADER: &str = "x-request-id";

// The request UID is known only once the body has been parsed: the span
// starts with the `request_id` assigned by the HTTP layer and the engine
// fills in the remaining fields.
#[tracing::instrument(
    name = "admission",
    fields(
        request_id = %request_id(&headers),
        host = crate::config::HOSTNAME.as_str(),
        request_uid = tracing::field::Empty,
        name = tracing::field::Empty,
        namespace = tracing::field::Empty,
        operation = tracing::field::Empty,
        kind_group = tracing::field::Empty,
        kind_version = tracing::field::Empty,
        kind = tracing::field::Empty,
        resource_group = tracing::field::Empty,
        resource_version = tracing::field::Empty,
        resource = tracing::field::Empty,
        allowed = tracing::field::Empty,
        mutated = tracing::field::Empty,
        response_message = tracing::field::Empty,
    ),
    skip_all)]
/// Evaluate an admission review.
///
/// Every request gets exactly one response: the serialized admission review on
/// success, or the status and message of the error otherwise.
pub(crate) async fn admission_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let start_time = Instant::now();
    let result = review(state, &method, &headers, body).await;
    let duration = start_time.elapsed();

    match result {
        Ok(outcome) => {
            info!(
                result = "success",
                allowed = outcome.allowed,
                duration = ?duration,
                "handled request"
            );

            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
                outcome.body,
            )
                .into_response()
        }
        Err(err) => {
            if err.status_code().is_server_error() {
                error!(error = %err, result = "error", duration = ?duration, "error handling request");
            } else {
                warn!(error = %err, result = "error", duration = ?duration, "error handling request");
            }

            ApiError::from(err).into_response()
        }
    }
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

async fn review(
    state: Arc<ApiServerState>,
    method: &Method,
    headers: &HeaderMap,
    body: Body,
) -> Result<ReviewOutcome> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    state
        .engine
        .validate_transport(method, content_type.as_deref())?;

    let body = axum::body::to_bytes(body, state.max_body_size)
        .await
        .map_err(|e| AdmissionError::UnreadableBody(e.to_string()))?;

    let engine = state.engine.clone();
    let span = Span::current();
    task::spawn_blocking(move || {
        let _enter = span.enter();
        engine.review(&span, &body)
    })
    .await
    .map_err(|e| AdmissionError::Internal(format!("admission policy failed: {e}")))?
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}
