use anyhow::Result;
use futures::StreamExt;
use hookline::{
    ndjson::{self, RelayFailure},
    providers::{configs::ConverseProviderConfig, converse::ConverseProvider},
    relay,
};
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Runs a hook request against a fake converse-stream endpoint
struct RelayTester {
    server: MockServer,
}

impl RelayTester {
    async fn new(status: u16, body: &str) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/model/mistral.mistral-large-2402-v1:0/converse-stream"))
            .respond_with(ResponseTemplate::new(status).set_body_raw(body, "application/x-ndjson"))
            .mount(&server)
            .await;
        Self { server }
    }

    async fn run(&self, body: Value) -> Result<Vec<Result<String, RelayFailure>>> {
        let config = ConverseProviderConfig {
            host: self.server.uri(),
            ..Default::default()
        };
        let model_id = config.model_id.clone();
        let provider = Arc::new(ConverseProvider::new(config)?);
        let events = relay::live(provider, &model_id, &body)?;
        Ok(ndjson::encode(events).collect().await)
    }
}

fn user_message() -> Value {
    json!({
        "messages": [{"role": "user", "content": [{"text": "Just say hello!"}]}],
        "system": [{"text": "You are a helpful assistant."}]
    })
}

#[tokio::test]
async fn test_relays_upstream_stream() -> Result<()> {
    let upstream = concat!(
        "{\"messageStart\":{\"role\":\"assistant\"}}\n",
        "{\"contentBlockDelta\":{\"delta\":{\"text\":\"Hello\"},\"contentBlockIndex\":0}}\n",
        "{\"contentBlockDelta\":{\"delta\":{\"text\":\"!\"},\"contentBlockIndex\":0}}\n",
        "{\"contentBlockStop\":{\"contentBlockIndex\":0}}\n",
        "{\"messageStop\":{\"stopReason\":\"end_turn\"}}\n",
        "{\"metadata\":{\"usage\":{\"inputTokens\":14,\"outputTokens\":2,",
        "\"totalTokens\":16},\"metrics\":{\"latencyMs\":301}}}\n"
    );
    let tester = RelayTester::new(200, upstream).await;

    let lines: Vec<Value> = tester
        .run(user_message())
        .await?
        .into_iter()
        .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
        .collect();

    assert_eq!(lines.len(), 6);
    let text: String = lines
        .iter()
        .filter_map(|line| line["contentBlockDelta"]["delta"]["text"].as_str())
        .collect();
    assert_eq!(text, "Hello!");
    assert_eq!(lines[3]["contentBlockStop"]["contentBlockIndex"], 0);
    assert_eq!(lines[4]["messageStop"]["stopReason"], "end_turn");
    assert_eq!(lines[5]["metadata"]["usage"]["totalTokens"], 16);
    assert!(lines
        .iter()
        .all(|line| line["format"] == "aws-bedrock-converse_stream"));
    Ok(())
}

#[tokio::test]
async fn test_upstream_lines_pass_through_unchanged() -> Result<()> {
    let upstream = [
        json!({
            "contentBlockDelta": {"delta": {"text": "Hi"}, "contentBlockIndex": 0},
            "p": "abcd"
        }),
        json!({"metadata": {
            "usage": {"inputTokens": 9, "outputTokens": 1, "cacheReadInputTokens": 4},
            "metrics": {"latencyMs": 120, "timeToFirstByteMs": 80}
        }}),
    ];
    let body: String = upstream.iter().map(|line| format!("{}\n", line)).collect();
    let tester = RelayTester::new(200, &body).await;

    let lines: Vec<Value> = tester
        .run(user_message())
        .await?
        .into_iter()
        .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
        .collect();

    assert_eq!(lines.len(), 2);
    for (mut relayed, original) in lines.into_iter().zip(upstream) {
        let format = relayed.as_object_mut().unwrap().remove("format");
        assert_eq!(format, Some(json!("aws-bedrock-converse_stream")));
        assert_eq!(relayed, original);
    }
    Ok(())
}

#[tokio::test]
async fn test_upstream_error_status_becomes_error_event() -> Result<()> {
    let tester = RelayTester::new(500, "internal failure").await;

    let items = tester.run(user_message()).await?;

    assert_eq!(items.len(), 2);
    let line: Value = serde_json::from_str(items[0].as_ref().unwrap())?;
    assert_eq!(line["messageStop"]["stopReason"], "error running agent");
    let text = line["contentBlockDelta"]["delta"]["text"].as_str().unwrap();
    assert!(text.starts_with("\nError: Upstream request failed: 500"));
    assert!(items[1].is_err());
    Ok(())
}

#[tokio::test]
async fn test_truncated_upstream_stream_becomes_error_event() -> Result<()> {
    let upstream = "{\"messageStart\":{\"role\":\"assistant\"}}\n{\"contentBlockDelta\":{\"del";
    let tester = RelayTester::new(200, upstream).await;

    let items = tester.run(user_message()).await?;

    assert_eq!(items.len(), 3);
    assert!(items[0].as_ref().unwrap().contains("messageStart"));
    assert!(items[1].as_ref().unwrap().contains("error running agent"));
    assert!(items[2].is_err());
    Ok(())
}

#[tokio::test]
async fn test_missing_messages_never_reaches_upstream() {
    let tester = RelayTester::new(200, "").await;

    let result = tester.run(json!({"system": []})).await;

    assert!(result.is_err());
    let requests = tester.server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}
