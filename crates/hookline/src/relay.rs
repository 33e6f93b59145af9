//! Live relay: forwards a hook request to the upstream model and re-emits its
//! converse stream event by event.

use async_stream::try_stream;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::RelayResult;
use crate::models::event::{FormattedEvent, StreamEvent};
use crate::models::request::{ConverseRequest, RequestPayload};
use crate::providers::base::Provider;

/// Events headed for a hook caller. The first `Err` ends the stream.
pub type RelayStream = BoxStream<'static, RelayResult<FormattedEvent>>;

/// Validate `body` and prepare a relay of the upstream converse stream.
///
/// Validation happens eagerly, so a bad payload fails here without touching
/// the upstream. The upstream call itself is only opened once the returned
/// stream is first polled, and dropping the stream abandons it.
pub fn live(
    provider: Arc<dyn Provider>,
    model_id: &str,
    body: &Value,
) -> RelayResult<RelayStream> {
    let payload = RequestPayload::from_value(body)?;
    let request = ConverseRequest::new(payload, model_id);
    Ok(Box::pin(relay_events(provider, request)))
}

fn relay_events(
    provider: Arc<dyn Provider>,
    request: ConverseRequest,
) -> impl Stream<Item = RelayResult<FormattedEvent>> + Send + 'static {
    try_stream! {
        info!(
            model_id = %request.model_id,
            messages = request.messages.len(),
            "Opening converse stream"
        );
        let mut upstream = provider.converse_stream(request).await?;
        while let Some(event) = upstream.next().await {
            let event = event?;
            log_event(&event.event);
            yield event.stamped();
            // Let other in-flight requests make progress between events.
            tokio::task::yield_now().await;
        }
    }
}

fn log_event(event: &StreamEvent) {
    match event {
        StreamEvent::MessageStart(start) => info!(role = %start.role, "Message started"),
        StreamEvent::ContentBlockDelta(block) => {
            if let Some(text) = &block.delta.text {
                debug!(text = %text, "Content delta");
            }
        }
        StreamEvent::MessageStop(stop) => {
            info!(stop_reason = %stop.stop_reason, "Message stopped")
        }
        StreamEvent::Metadata(metadata) => {
            if let Some(usage) = &metadata.usage {
                info!(
                    input_tokens = ?usage.input_tokens,
                    output_tokens = ?usage.output_tokens,
                    total_tokens = ?usage.total_tokens,
                    "Token usage"
                );
            }
            if let Some(metrics) = &metadata.metrics {
                info!(latency_ms = ?metrics.latency_ms, "Latency");
            }
        }
        StreamEvent::ContentBlockStart(_) | StreamEvent::ContentBlockStop(_) => {}
    }
}
