//! Canned relay that shows the wire format without calling a model.

use futures::stream;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::errors::RelayResult;
use crate::models::event::{
    ContentBlockDelta, Delta, FormattedEvent, MessageStart, Role, StreamEvent, Usage,
};
use crate::relay::RelayStream;

/// The fixed response: role announcement, one rich-text document, stop, usage.
///
/// Billing rides on the last line as a top-level `atrium` key, next to
/// `metadata` rather than inside it.
pub fn canned_events() -> Vec<FormattedEvent> {
    let events = vec![
        StreamEvent::MessageStart(MessageStart {
            role: Role::System,
            kind: Some("RT_BLOCK".to_string()),
            other: Map::new(),
        }),
        StreamEvent::ContentBlockDelta(ContentBlockDelta::new(Delta::block(document()))),
        StreamEvent::message_stop("stop"),
    ];
    let usage = StreamEvent::usage(Usage::new(300, 1500), 300);

    let mut lines: Vec<FormattedEvent> = events.into_iter().map(FormattedEvent::from).collect();
    lines.push(
        FormattedEvent::from(usage)
            .with_extra("atrium", json!({"billing": {"credits_consumed": 20}})),
    );
    lines
}

fn document() -> Value {
    json!({
        "children": [
            {
                "id": "12",
                "type": "h1",
                "children": [{"text": "🌱 Hello world 👋!"}]
            },
            {
                "id": "jihnx",
                "type": "p",
                "children": [
                    {
                        "text": "This is my very first message to the universe \
                                 via Atrium's Agent platform."
                    }
                ]
            },
            {
                "id": "14",
                "type": "p",
                "children": [
                    {"text": "You can output rich text. Make text "},
                    {"bold": true, "text": "bold"},
                    {"text": ", "},
                    {"text": "italic", "italic": true},
                    {"text": ", "},
                    {"text": "underlined", "underline": true},
                    {"text": ", or apply a "},
                    {"bold": true, "text": "combination", "italic": true, "underline": true},
                    {"text": " of these styles for a visually striking effect."}
                ]
            },
            {
                "id": "ng1xl",
                "type": "p",
                "children": [
                    {"text": "Learn more on how to format your message using the"},
                    {
                        "id": "ppvtq",
                        "url": "https://atrium.st/editor/playground/",
                        "type": "a",
                        "children": [{"text": "Rich Text"}]
                    },
                    {"text": " editor."}
                ]
            }
        ]
    })
}

/// Relay the canned response. The input is only logged.
pub fn events(body: &Value) -> RelayStream {
    debug!(input = %body, "Serving illustration response");
    let items: Vec<RelayResult<FormattedEvent>> = canned_events().into_iter().map(Ok).collect();
    Box::pin(stream::iter(items))
}
