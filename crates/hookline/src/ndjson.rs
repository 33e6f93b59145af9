//! Line framing for relayed events.
//!
//! Each event becomes one JSON object followed by a single `\n`. A failed
//! stream ends with one [`ErrorEvent`] line and then a [`RelayFailure`].

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::errors::{RelayError, RelayResult};
use crate::models::event::ErrorEvent;
use crate::relay::RelayStream;

/// Longest error description embedded in an [`ErrorEvent`].
pub const MAX_ERROR_CHARS: usize = 200;

/// Raised after the terminal error line of a failed stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Relay failed: {detail}")]
pub struct RelayFailure {
    pub detail: String,
}

impl RelayFailure {
    /// HTTP status the failure corresponds to.
    pub const STATUS: u16 = 500;
}

/// Error description cut to [`MAX_ERROR_CHARS`] characters.
pub fn error_detail(err: &RelayError) -> String {
    err.to_string().chars().take(MAX_ERROR_CHARS).collect()
}

pub fn error_message(detail: &str) -> String {
    format!("\nError: {}", detail)
}

pub fn encode_line<T: Serialize>(event: &T) -> RelayResult<String> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    Ok(line)
}

/// Frame a relay stream as NDJSON lines, one per event, without batching.
pub fn encode(
    events: RelayStream,
) -> impl Stream<Item = Result<String, RelayFailure>> + Send + 'static {
    stream! {
        let mut events = events;
        while let Some(item) = events.next().await {
            let err = match item.and_then(|event| encode_line(&event)) {
                Ok(line) => {
                    yield Ok(line);
                    continue;
                }
                Err(err) => err,
            };

            let detail = error_detail(&err);
            let message = error_message(&detail);
            error!(error = %detail, "Relay failed");
            match encode_line(&ErrorEvent::new(message)) {
                Ok(line) => yield Ok(line),
                Err(e) => error!(error = %e, "Failed to encode error event"),
            }
            yield Err(RelayFailure { detail });
            break;
        }
    }
}
