use anyhow::{anyhow, Context, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{header, Client};
use serde_json::json;
use std::time::Duration;

use super::base::{EventStream, Provider};
use super::configs::ConverseProviderConfig;
use crate::models::event::FormattedEvent;
use crate::models::request::ConverseRequest;

/// Calls a converse-stream gateway over HTTP.
///
/// The gateway is expected to accept `POST {host}/model/{modelId}/converse-stream`
/// with a JSON body of `{"messages": [...], "system": [...]}` and to answer
/// with `application/x-ndjson`: one converse-stream event object per line,
/// e.g. `{"contentBlockDelta":{"delta":{"text":"Hi"}}}`. Signing requests and
/// decoding the binary `application/vnd.amazon.eventstream` framing of the
/// native Bedrock endpoint are the gateway's job; pointing `host` straight at
/// Bedrock fails on the first frame.
pub struct ConverseProvider {
    client: Client,
    config: ConverseProviderConfig,
}

impl ConverseProvider {
    pub fn new(config: ConverseProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, model_id: &str) -> String {
        format!(
            "{}/model/{}/converse-stream",
            self.config.host.trim_end_matches('/'),
            model_id
        )
    }
}

fn parse_line(line: &[u8]) -> Result<Option<FormattedEvent>> {
    let line = std::str::from_utf8(line).context("Upstream sent a non UTF-8 line")?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let event = serde_json::from_str(line)
        .with_context(|| format!("Malformed upstream event: {}", line))?;
    Ok(Some(event))
}

/// Split a chunked byte stream into lines and parse each one as an event.
/// Chunk boundaries need not line up with line boundaries.
fn ndjson_events<S, B>(
    chunks: S,
) -> impl Stream<Item = Result<FormattedEvent>> + Send + 'static
where
    S: Stream<Item = reqwest::Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    try_stream! {
        let mut chunks = Box::pin(chunks);
        let mut buffer: Vec<u8> = Vec::new();
        while let Some(chunk) = chunks.next().await {
            buffer.extend_from_slice(chunk?.as_ref());
            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                if let Some(event) = parse_line(&line)? {
                    yield event;
                }
            }
        }
        if let Some(event) = parse_line(&buffer)? {
            yield event;
        }
    }
}

#[async_trait]
impl Provider for ConverseProvider {
    async fn converse_stream(&self, request: ConverseRequest) -> Result<EventStream> {
        let payload = json!({
            "messages": request.messages,
            "system": request.system,
        });

        let mut builder = self
            .client
            .post(self.url(&request.model_id))
            .header(header::ACCEPT, "application/x-ndjson")
            .json(&payload);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Upstream request failed: {} {}", status, body.trim()));
        }

        Ok(Box::pin(ndjson_events(response.bytes_stream())))
    }
}
