use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::models::event::FormattedEvent;
use crate::models::request::ConverseRequest;

/// Events of one upstream call, in arrival order, each with whatever
/// top-level keys the upstream sent alongside it.
pub type EventStream = BoxStream<'static, Result<FormattedEvent>>;

/// Base trait for upstream model backends that answer with a converse stream
#[async_trait]
pub trait Provider: Send + Sync {
    /// Open a fresh streaming call. Each invocation is an independent call;
    /// the returned stream is not restartable.
    async fn converse_stream(&self, request: ConverseRequest) -> Result<EventStream>;
}
