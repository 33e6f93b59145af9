use anyhow::{anyhow, Result};
use async_stream::stream;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::event::{FormattedEvent, StreamEvent};
use crate::models::request::ConverseRequest;
use crate::providers::base::{EventStream, Provider};

/// Flags the upstream stream as dropped when the relay lets go of it.
struct DropGuard(Arc<AtomicBool>);

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A mock provider that replays a pre-configured converse stream for testing.
/// Every call replays the full script from the start.
pub struct MockProvider {
    events: Vec<FormattedEvent>,
    fail_after: Option<String>,
    fail_to_open: Option<String>,
    hold_open: bool,
    calls: AtomicUsize,
    pulled: Arc<AtomicUsize>,
    dropped: Arc<AtomicBool>,
    last_request: Mutex<Option<ConverseRequest>>,
}

impl MockProvider {
    /// Stream the given events and end cleanly.
    pub fn new(events: Vec<StreamEvent>) -> Self {
        Self::with_lines(events.into_iter().map(FormattedEvent::from).collect())
    }

    /// Stream the given lines, keeping any extra top-level keys they carry.
    pub fn with_lines(events: Vec<FormattedEvent>) -> Self {
        Self {
            events,
            fail_after: None,
            fail_to_open: None,
            hold_open: false,
            calls: AtomicUsize::new(0),
            pulled: Arc::new(AtomicUsize::new(0)),
            dropped: Arc::new(AtomicBool::new(false)),
            last_request: Mutex::new(None),
        }
    }

    /// Stream the given events, then fail with `message`.
    pub fn failing_after<S: Into<String>>(events: Vec<StreamEvent>, message: S) -> Self {
        Self {
            fail_after: Some(message.into()),
            ..Self::new(events)
        }
    }

    /// Refuse to open the stream at all.
    pub fn failing_to_open<S: Into<String>>(message: S) -> Self {
        Self {
            fail_to_open: Some(message.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Stream the given events, then stay open without ever finishing, like a
    /// model that is still generating.
    pub fn held_open(events: Vec<StreamEvent>) -> Self {
        Self {
            hold_open: true,
            ..Self::new(events)
        }
    }

    /// Number of upstream calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of events taken from upstream streams so far.
    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }

    /// Whether an upstream stream handed out by this provider has been dropped.
    pub fn upstream_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ConverseRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn converse_stream(&self, request: ConverseRequest) -> Result<EventStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(request);

        if let Some(message) = &self.fail_to_open {
            return Err(anyhow!("{}", message));
        }

        let mut items: Vec<Result<FormattedEvent>> = self.events.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.fail_after {
            items.push(Err(anyhow!("{}", message)));
        }
        let hold_open = self.hold_open;
        let pulled = self.pulled.clone();
        let guard = DropGuard(self.dropped.clone());

        Ok(Box::pin(stream! {
            let _guard = guard;
            for item in items {
                pulled.fetch_add(1, Ordering::SeqCst);
                yield item;
            }
            if hold_open {
                std::future::pending::<()>().await;
            }
        }))
    }
}
