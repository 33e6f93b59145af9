use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use futures::{stream::BoxStream, Stream, StreamExt};
use hookline::{
    illustration,
    ndjson::{self, RelayFailure},
    relay::{self, RelayStream},
};
use serde_json::Value;
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tracing::{error, info};

const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Streamed response body, one JSON event per line.
///
/// A relay failure is written as a terminal error line by the framing layer;
/// the failure that follows it aborts the body so the transport sees the
/// response as failed.
pub struct NdjsonResponse {
    lines: BoxStream<'static, Result<String, RelayFailure>>,
}

impl NdjsonResponse {
    fn new(events: RelayStream) -> Self {
        Self {
            lines: ndjson::encode(events).boxed(),
        }
    }
}

impl Stream for NdjsonResponse {
    type Item = Result<Bytes, RelayFailure>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.lines.poll_next_unpin(cx).map(|opt| {
            opt.map(|line| {
                line.map(Bytes::from).map_err(|failure| {
                    error!(
                        status = RelayFailure::STATUS,
                        detail = %failure.detail,
                        "Aborting streamed response"
                    );
                    failure
                })
            })
        })
    }
}

impl IntoResponse for NdjsonResponse {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
            Body::from_stream(self),
        )
            .into_response()
    }
}

fn parse_body(hook: &str, body: &Bytes) -> Result<Value, ApiError> {
    let input: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))?;
    info!(hook, input = %input, "Received input");
    Ok(input)
}

fn live_hook(hook: &str, state: &AppState, body: &Bytes) -> Result<NdjsonResponse, ApiError> {
    let input = parse_body(hook, body)?;
    let events = relay::live(state.provider.clone(), &state.model_id, &input)?;
    Ok(NdjsonResponse::new(events))
}

async fn on_preprocess(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<NdjsonResponse, ApiError> {
    live_hook("on_preprocess", &state, &body)
}

async fn on_prompt(body: Bytes) -> Result<NdjsonResponse, ApiError> {
    let input = parse_body("on_prompt", &body)?;
    Ok(NdjsonResponse::new(illustration::events(&input)))
}

async fn on_postprocess(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<NdjsonResponse, ApiError> {
    live_hook("on_postprocess", &state, &body)
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/on_preprocess", post(on_preprocess))
        .route("/on_prompt", post(on_prompt))
        .route("/on_postprocess", post(on_postprocess))
        .with_state(state)
}
