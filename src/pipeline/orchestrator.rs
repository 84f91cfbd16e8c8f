use dashmap::DashSet;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::entities::{ContentItem, ContentSource, ContentStatus};
use crate::extractor::{EmptyContentError, extract_html};
use crate::fetcher::{DEFAULT_FETCH_TIMEOUT, FetchError, Fetcher};
use crate::insights::{InsightGenerator, RetryPolicy, TextGenerator};
use crate::pipeline::errors::{OrchestratorError, PipelineError};
use crate::pipeline::events::{ListenerRegistry, ProcessingEvent};
use crate::repositories::ContentStore;

const SHUTDOWN_FAILURE_MESSAGE: &str = "orchestrator shut down before the item was queued";

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Max pipelines running at once.
    pub concurrency: usize,
    pub fetch_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// What callers see of an item's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentResult {
    pub id: Uuid,
    pub status: ContentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<ContentItem> for ContentResult {
    fn from(item: ContentItem) -> Self {
        let (summary, keywords) = match item.insights {
            Some(insights) => (Some(insights.summary), Some(insights.keywords)),
            None => (None, None),
        };
        Self {
            id: item.id,
            status: item.status,
            summary,
            keywords,
            error_message: item.error_message,
        }
    }
}

/// State shared by the dispatcher and every pipeline task.
struct Shared {
    store: Arc<dyn ContentStore>,
    fetcher: Fetcher,
    insights: InsightGenerator,
    listeners: ListenerRegistry,
    listener_tasks: TaskTracker,
    /// Ids with a pipeline currently running.
    in_flight: DashSet<Uuid>,
}

/// Drives submitted content through `pending -> processing -> completed | failed`.
///
/// Work runs on background tasks; a caller can stop polling at any time but
/// cannot abort an accepted submission.
pub struct Orchestrator {
    shared: Arc<Shared>,
    queue: mpsc::UnboundedSender<Uuid>,
    shutdown_token: CancellationToken,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    /// Must be called from within a tokio runtime; spawns the dispatcher.
    pub fn new(
        store: Arc<dyn ContentStore>,
        generator: Arc<dyn TextGenerator>,
        listeners: ListenerRegistry,
        config: OrchestratorConfig,
    ) -> Result<Self, FetchError> {
        let concurrency = config.concurrency.max(1);
        info!(
            concurrency,
            fetch_timeout_ms = config.fetch_timeout.as_millis() as u64,
            max_attempts = config.retry.max_attempts,
            listeners = ?listeners.registered_names(),
            "starting orchestrator"
        );

        let shared = Arc::new(Shared {
            store,
            fetcher: Fetcher::new(config.fetch_timeout)?,
            insights: InsightGenerator::new(generator, config.retry),
            listeners,
            listener_tasks: TaskTracker::new(),
            in_flight: DashSet::new(),
        });

        // Unbounded: `submit` never waits on a dispatcher parked on a permit.
        let (queue, receiver) = mpsc::unbounded_channel();
        let shutdown_token = CancellationToken::new();

        let dispatcher = tokio::spawn(
            run_dispatcher(
                shared.clone(),
                receiver,
                Arc::new(Semaphore::new(concurrency)),
                concurrency,
                shutdown_token.clone(),
            )
            .instrument(info_span!("dispatcher")),
        );

        Ok(Self {
            shared,
            queue,
            shutdown_token,
            dispatcher: Mutex::new(Some(dispatcher)),
        })
    }

    /// Accept a submission. The item is already `processing` when this returns.
    #[instrument(skip_all, fields(kind = ?source.kind()))]
    pub async fn submit(&self, source: ContentSource) -> Result<Uuid, OrchestratorError> {
        if self.shutdown_token.is_cancelled() {
            return Err(OrchestratorError::ShuttingDown);
        }

        let item = self.shared.store.create(&source).await?;
        if !self.shared.store.begin_processing(item.id).await? {
            // a freshly created item is always pending
            error!(content_id = %item.id, "new item was not pending");
            return Err(OrchestratorError::AlreadyProcessing(item.id));
        }

        self.dispatch(item.id).await?;
        info!(content_id = %item.id, "content accepted");
        Ok(item.id)
    }

    /// Re-dispatch an item that was persisted but never started, e.g. after a
    /// restart. Items already running or finished are rejected.
    #[instrument(skip(self))]
    pub async fn resubmit(&self, id: Uuid) -> Result<(), OrchestratorError> {
        if self.shutdown_token.is_cancelled() {
            return Err(OrchestratorError::ShuttingDown);
        }

        let item = self
            .shared
            .store
            .find_by_id(id)
            .await?
            .ok_or(OrchestratorError::NotFound(id))?;

        match item.status {
            ContentStatus::Pending => {}
            ContentStatus::Processing => return Err(OrchestratorError::AlreadyProcessing(id)),
            status => return Err(OrchestratorError::AlreadyTerminal { id, status }),
        }

        if !self.shared.store.begin_processing(id).await? {
            // lost the race with another resubmission
            return Err(OrchestratorError::AlreadyProcessing(id));
        }
        self.dispatch(id).await
    }

    async fn dispatch(&self, id: Uuid) -> Result<(), OrchestratorError> {
        if self.queue.send(id).is_err() {
            warn!(content_id = %id, "dispatcher closed, failing submission");
            self.shared
                .store
                .update_status(id, ContentStatus::Failed, Some(SHUTDOWN_FAILURE_MESSAGE))
                .await?;
            return Err(OrchestratorError::ShuttingDown);
        }
        Ok(())
    }

    pub async fn get_status(&self, id: Uuid) -> Result<ContentStatus, OrchestratorError> {
        self.find(id).await.map(|item| item.status)
    }

    pub async fn get_result(&self, id: Uuid) -> Result<ContentResult, OrchestratorError> {
        self.find(id).await.map(ContentResult::from)
    }

    pub async fn list_recent(&self, limit: usize) -> Result<Vec<ContentResult>, OrchestratorError> {
        let items = self.shared.store.list_recent(limit).await?;
        Ok(items.into_iter().map(ContentResult::from).collect())
    }

    async fn find(&self, id: Uuid) -> Result<ContentItem, OrchestratorError> {
        self.shared
            .store
            .find_by_id(id)
            .await?
            .ok_or(OrchestratorError::NotFound(id))
    }

    /// Stop accepting work and wait until every accepted submission, queued
    /// ones included, reached a terminal state and every listener has been
    /// notified.
    pub async fn shutdown(&self) {
        self.shutdown_token.cancel();

        let handle = self
            .dispatcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            error!("dispatcher task failed: {}", e);
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

async fn run_dispatcher(
    shared: Arc<Shared>,
    mut queue: mpsc::UnboundedReceiver<Uuid>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    shutdown_token: CancellationToken,
) {
    while let Some(content_id) = tokio::select! {
        biased;
        _ = shutdown_token.cancelled() => None,
        content_id = queue.recv() => content_id,
    } {
        if !start_pipeline(&shared, &semaphore, content_id).await {
            break;
        }
    }

    // Submissions queued before the close were accepted and still run.
    queue.close();
    while let Some(content_id) = queue.recv().await {
        if !start_pipeline(&shared, &semaphore, content_id).await {
            break;
        }
    }

    info!("dispatcher stopping, waiting for in-flight pipelines");
    match semaphore.acquire_many(concurrency as u32).await {
        Ok(_permits) => info!("all pipelines finished"),
        Err(e) => error!("failed waiting for pipelines: {}", e),
    }

    shared.listener_tasks.close();
    shared.listener_tasks.wait().await;
    info!("dispatcher stopped");
}

/// Spawns the pipeline for `content_id` once a permit is free. Duplicates of
/// an in-flight id are dropped without notifying listeners. Returns `false`
/// only when the semaphore is closed.
async fn start_pipeline(
    shared: &Arc<Shared>,
    semaphore: &Arc<Semaphore>,
    content_id: Uuid,
) -> bool {
    if !shared.in_flight.insert(content_id) {
        warn!(%content_id, "duplicate submission for in-flight item rejected");
        return true;
    }
    shared.listeners.notify(ProcessingEvent::Submitted { content_id }, &shared.listener_tasks);

    let permit = match semaphore.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            error!(%content_id, "semaphore closed: {}", e);
            shared.in_flight.remove(&content_id);
            return false;
        }
    };

    let shared = shared.clone();
    tokio::spawn(
        async move {
            let _permit = permit; // Hold permit until the pipeline is terminal
            run_pipeline(&shared, content_id).await;
        }
        .instrument(info_span!("pipeline", content_id = %content_id)),
    );
    true
}

async fn run_pipeline(shared: &Shared, id: Uuid) {
    let outcome = process(shared, id).await;
    shared.in_flight.remove(&id);

    let event = match outcome {
        Ok(true) => {
            info!("content item completed");
            ProcessingEvent::Processed { content_id: id }
        }
        Ok(false) => return,
        Err(err) => {
            let message = err.to_string();
            error!(stage = err.stage(), error = %message, "content item failed");
            match shared
                .store
                .update_status(id, ContentStatus::Failed, Some(&message))
                .await
            {
                Ok(true) => {}
                Ok(false) => warn!("item already terminal, failure not recorded"),
                Err(e) => error!("failed to record failure: {}", e),
            }
            ProcessingEvent::Failed {
                content_id: id,
                error: message,
            }
        }
    };

    shared.listeners.notify(event, &shared.listener_tasks);
}

/// Returns `Ok(false)` when the item was skipped.
async fn process(shared: &Shared, id: Uuid) -> Result<bool, PipelineError> {
    let Some(item) = shared.store.find_by_id(id).await? else {
        warn!("item vanished before processing");
        return Ok(false);
    };
    if item.status != ContentStatus::Processing {
        debug!(status = %item.status, "item not processing, skipping");
        return Ok(false);
    }

    let text = source_text(shared, &item).await?;
    let insights = shared.insights.generate(&text).await?;

    if !shared.store.save_insights(id, &insights).await? {
        warn!("item left processing before insights were saved");
        return Ok(false);
    }
    Ok(true)
}

/// Raw text for the item: given for text sources, fetched and extracted once
/// for URL sources.
async fn source_text(shared: &Shared, item: &ContentItem) -> Result<String, PipelineError> {
    if let Some(text) = &item.raw_text {
        if text.trim().is_empty() {
            return Err(EmptyContentError.into());
        }
        debug!(chars = text.len(), "using stored raw text");
        return Ok(text.clone());
    }

    let Some(url) = item.source_url.as_deref() else {
        return Err(EmptyContentError.into());
    };

    let page = shared.fetcher.fetch(url).await?;
    info!(
        url_final = %page.url_final,
        status = page.status.as_u16(),
        encoding = page.encoding,
        bytes = page.body_utf8.len(),
        "page fetched"
    );

    let html = page.body_utf8;
    let text = tokio::task::spawn_blocking(move || extract_html(&html))
        .await
        .map_err(|e| PipelineError::ExtractionAborted(e.to_string()))??;

    if !shared.store.save_raw_text(item.id, &text).await? {
        warn!("raw text already set, keeping the stored value");
    }
    Ok(text)
}
