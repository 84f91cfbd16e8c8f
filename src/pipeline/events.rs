use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Messages flowing through the orchestrator's channel.
///
/// `Submitted` carries only the id; handlers re-read current state from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ProcessingEvent {
    Submitted { content_id: Uuid },
    Processed { content_id: Uuid },
    Failed { content_id: Uuid, error: String },
}

impl ProcessingEvent {
    pub fn content_id(&self) -> Uuid {
        match self {
            Self::Submitted { content_id }
            | Self::Processed { content_id }
            | Self::Failed { content_id, .. } => *content_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "submitted",
            Self::Processed { .. } => "processed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Secondary side effect attached to processing events (alerting, audit, ...).
#[async_trait]
pub trait EventListener: Send + Sync + 'static {
    async fn on_event(&self, event: &ProcessingEvent) -> anyhow::Result<()>;

    /// Used in logs when the listener fails.
    fn name(&self) -> &'static str;
}

/// Listeners fixed at orchestrator construction.
#[derive(Default, Clone)]
pub struct ListenerRegistry {
    listeners: Vec<Arc<dyn EventListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<L: EventListener>(&mut self, listener: L) {
        self.listeners.push(Arc::new(listener));
    }

    pub fn registered_names(&self) -> Vec<&'static str> {
        self.listeners.iter().map(|l| l.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every listener in registration order, off the
    /// caller's task. Errors and panics are logged and go no further.
    pub fn notify(&self, event: ProcessingEvent, tracker: &TaskTracker) {
        if self.listeners.is_empty() {
            return;
        }
        let listeners = self.listeners.clone();
        let span = info_span!("notify", kind = event.kind(), content_id = %event.content_id());

        tracker.spawn(
            async move {
                for listener in listeners {
                    let name = listener.name();
                    let event = event.clone();
                    let delivery = tokio::spawn(async move { listener.on_event(&event).await });
                    match delivery.await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!(listener = name, error = %e, "event listener failed"),
                        Err(e) => error!(listener = name, error = %e, "event listener panicked"),
                    }
                }
            }
            .instrument(span),
        );
    }
}

/// Writes every event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

#[async_trait]
impl EventListener for LoggingListener {
    async fn on_event(&self, event: &ProcessingEvent) -> anyhow::Result<()> {
        match event {
            ProcessingEvent::Submitted { content_id } => {
                info!(%content_id, "content submitted")
            }
            ProcessingEvent::Processed { content_id } => {
                info!(%content_id, "content processed")
            }
            ProcessingEvent::Failed { content_id, error } => {
                warn!(%content_id, %error, "content processing failed")
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "logging"
    }
}
