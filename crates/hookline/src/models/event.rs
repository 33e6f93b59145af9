//! Events of a converse stream, as relayed to hook callers.
//!
//! Every event serializes to a JSON object keyed by its kind, e.g.
//! `{"messageStart":{"role":"assistant"}}`, which is the shape line-oriented
//! clients discriminate on. Keys the model sends that are not modelled here
//! are kept and written back out unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Dialect tag stamped on events that came from the upstream model.
pub const CONVERSE_STREAM_FORMAT: &str = "aws-bedrock-converse_stream";

/// Stop reason carried by the terminal event of a failed stream.
pub const ERROR_STOP_REASON: &str = "error running agent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
            Role::System => f.write_str("system"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageStart {
    pub role: Role,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlockStart {
    pub start: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_block_index: Option<u32>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Incremental content. Text deltas use `text`; structured documents use
/// `block`; anything else the model sends (tool use input, reasoning) is
/// kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Delta {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn block(block: Value) -> Self {
        Self {
            block: Some(block),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlockDelta {
    pub delta: Delta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_block_index: Option<u32>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ContentBlockDelta {
    pub fn new(delta: Delta) -> Self {
        Self {
            delta,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlockStop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_block_index: Option<u32>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStop {
    pub stop_reason: String,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl MessageStop {
    pub fn new<S: Into<String>>(stop_reason: S) -> Self {
        Self {
            stop_reason: stop_reason.into(),
            other: Map::new(),
        }
    }
}

/// Token counts. Models differ in which counters they report, so all of
/// them are optional and unrecognised ones (cache reads/writes) are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens: Some(input_tokens),
            output_tokens: Some(output_tokens),
            total_tokens: Some(input_tokens + output_tokens),
            other: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Metrics {
    pub fn latency(latency_ms: u64) -> Self {
        Self {
            latency_ms: Some(latency_ms),
            other: Map::new(),
        }
    }
}

/// Trailing accounting for a response. Keys other than `usage` and `metrics`
/// (trace, performance config, ...) are carried through in `extensions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// One unit of a model's incremental response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamEvent {
    MessageStart(MessageStart),
    ContentBlockStart(ContentBlockStart),
    ContentBlockDelta(ContentBlockDelta),
    ContentBlockStop(ContentBlockStop),
    MessageStop(MessageStop),
    Metadata(Metadata),
}

impl StreamEvent {
    pub fn message_start(role: Role) -> Self {
        StreamEvent::MessageStart(MessageStart {
            role,
            kind: None,
            other: Map::new(),
        })
    }

    pub fn text_delta<S: Into<String>>(text: S) -> Self {
        StreamEvent::ContentBlockDelta(ContentBlockDelta::new(Delta::text(text)))
    }

    pub fn message_stop<S: Into<String>>(stop_reason: S) -> Self {
        StreamEvent::MessageStop(MessageStop::new(stop_reason))
    }

    pub fn usage(usage: Usage, latency_ms: u64) -> Self {
        StreamEvent::Metadata(Metadata {
            usage: Some(usage),
            metrics: Some(Metrics::latency(latency_ms)),
            extensions: Map::new(),
        })
    }

    /// Wrap the event with the upstream dialect tag.
    pub fn stamped(self) -> FormattedEvent {
        FormattedEvent::from(self).stamped()
    }
}

/// One line of a converse stream: the event, its optional `format` tag, and
/// any other top-level keys that travelled alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedEvent {
    #[serde(flatten)]
    pub event: StreamEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FormattedEvent {
    /// Tag the line with the upstream dialect, leaving everything else as is.
    pub fn stamped(mut self) -> Self {
        self.format = Some(CONVERSE_STREAM_FORMAT.to_string());
        self
    }

    pub fn with_extra<S: Into<String>>(mut self, key: S, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

impl From<StreamEvent> for FormattedEvent {
    fn from(event: StreamEvent) -> Self {
        Self {
            event,
            format: None,
            extra: Map::new(),
        }
    }
}

/// Terminal line of a stream that failed after it was opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEvent {
    pub message_stop: MessageStop,
    pub content_block_delta: ContentBlockDelta,
}

impl ErrorEvent {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message_stop: MessageStop::new(ERROR_STOP_REASON),
            content_block_delta: ContentBlockDelta::new(Delta::text(message)),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.content_block_delta.delta.text.as_deref()
    }
}
