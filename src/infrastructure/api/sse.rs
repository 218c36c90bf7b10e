//! Live update bridge
//!
//! Opens a server-sent-event connection and forwards every decoded `Image` to
//! a caller-supplied handler, in arrival order, from a dedicated task. The
//! returned [`Subscription`] owns the connection: `close()` consumes it, so a
//! handle can only be closed once, and dropping it unclosed still tears the
//! connection down.
//!
//! No reconnection, backoff or replay: when the connection goes away,
//! delivery stops until a new subscription is created. Malformed payloads
//! are skipped (and counted) without closing the subscription.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::StreamExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::client::ImageApiClient;
use crate::domain::models::Image;
use crate::domain::services::validate_id;
use crate::shared::errors::{ApiOperation, ClientError, Result};
use crate::shared::logging::{
    log_stream_closed, log_stream_ended, log_stream_event_skipped, log_stream_leaked,
    log_stream_opened,
};
use crate::shared::utils::SseDecoder;

/// Which updates a subscription receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamScope {
    /// Every creation/update system-wide
    All,
    /// Updates for a single image
    Image(String),
}

impl StreamScope {
    pub fn operation(&self) -> ApiOperation {
        match self {
            StreamScope::All => ApiOperation::StreamAllImages,
            StreamScope::Image(_) => ApiOperation::StreamImage,
        }
    }

    pub fn label(&self) -> String {
        match self {
            StreamScope::All => "all".to_string(),
            StreamScope::Image(id) => format!("image:{}", id),
        }
    }
}

/// Delivery counters for one subscription
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Events decoded and handed to the handler
    pub delivered: u64,
    /// Events dropped because their payload was not a valid `Image`
    pub skipped: u64,
}

#[derive(Debug, Default)]
struct StreamCounters {
    delivered: AtomicU64,
    skipped: AtomicU64,
}

impl StreamCounters {
    fn snapshot(&self) -> StreamStats {
        StreamStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Handle to one live event-stream connection
#[derive(Debug)]
pub struct Subscription {
    scope: StreamScope,
    label: String,
    closed: Arc<AtomicBool>,
    counters: Arc<StreamCounters>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<()>>>,
}

impl Subscription {
    pub fn scope(&self) -> &StreamScope {
        &self.scope
    }

    pub fn stats(&self) -> StreamStats {
        self.counters.snapshot()
    }

    /// The connection has ended (server closed, transport failed or handler panicked)
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Resolves when the stream ends without `close` being called.
    ///
    /// Cancel-safe: can be raced against a shutdown signal in `select!` and
    /// the subscription closed afterwards.
    pub async fn disconnected(&mut self) -> Result<()> {
        let Some(task) = self.task.as_mut() else {
            return Ok(());
        };
        let outcome = task.await;
        self.task = None;
        self.shutdown = None;

        match outcome {
            Ok(result) => result,
            Err(join_error) => Err(ClientError::StreamTask(join_error.to_string())),
        }
    }

    /// Stop delivery and release the connection.
    ///
    /// No handler invocation starts once this is called; when it returns the
    /// handler has been dropped.
    pub async fn close(mut self) -> StreamStats {
        self.closed.store(true, Ordering::Release);
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(join_error) = task.await {
                tracing::warn!(
                    scope = %self.label,
                    error = %join_error,
                    "Stream task ended abnormally"
                );
            }
        }

        let stats = self.stats();
        log_stream_closed(&self.label, stats.delivered, stats.skipped);
        stats
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                log_stream_leaked(&self.label);
            }
            self.closed.store(true, Ordering::Release);
            task.abort();
        }
    }
}

struct StreamContext {
    http: Client,
    url: String,
    label: String,
    operation: ApiOperation,
    closed: Arc<AtomicBool>,
    counters: Arc<StreamCounters>,
}

impl ImageApiClient {
    /// Subscribe to every image creation/update.
    ///
    /// Must be called from within a tokio runtime.
    pub fn stream_all_images<F>(&self, on_message: F) -> Subscription
    where
        F: FnMut(Image) + Send + 'static,
    {
        self.spawn_subscription(StreamScope::All, on_message)
    }

    /// Subscribe to updates of a single image.
    pub fn stream_image<F>(&self, id: &str, on_message: F) -> Result<Subscription>
    where
        F: FnMut(Image) + Send + 'static,
    {
        self.subscribe(StreamScope::Image(id.to_string()), on_message)
    }

    pub fn subscribe<F>(&self, scope: StreamScope, on_message: F) -> Result<Subscription>
    where
        F: FnMut(Image) + Send + 'static,
    {
        if let StreamScope::Image(id) = &scope {
            validate_id(id)?;
        }
        Ok(self.spawn_subscription(scope, on_message))
    }

    fn spawn_subscription<F>(&self, scope: StreamScope, on_message: F) -> Subscription
    where
        F: FnMut(Image) + Send + 'static,
    {
        let url = match &scope {
            StreamScope::All => self.collection_url("sse"),
            StreamScope::Image(id) => self.item_url(id, "/sse"),
        };
        let label = scope.label();
        let closed = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(StreamCounters::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let context = StreamContext {
            http: self.http.clone(),
            url,
            label: label.clone(),
            operation: scope.operation(),
            closed: Arc::clone(&closed),
            counters: Arc::clone(&counters),
        };

        let task = tokio::spawn(async move {
            let closed = Arc::clone(&context.closed);
            let label = context.label.clone();
            let result = run_stream(context, on_message, shutdown_rx).await;
            if !closed.load(Ordering::Acquire) {
                log_stream_ended(&label, result.as_ref().err());
            }
            result
        });

        Subscription {
            scope,
            label,
            closed,
            counters,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

async fn run_stream<F>(
    context: StreamContext,
    mut on_message: F,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<()>
where
    F: FnMut(Image) + Send + 'static,
{
    let operation = context.operation;
    let request = context
        .http
        .get(&context.url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache");

    // Either branch of `shutdown` (signal or sender dropped) means stop.
    let response = tokio::select! {
        _ = &mut shutdown => return Ok(()),
        response = request.send() => {
            response.map_err(|source| ClientError::Transport { operation, source })?
        }
    };

    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status { operation, status });
    }
    log_stream_opened(&context.label, &context.url);

    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    loop {
        let chunk = tokio::select! {
            biased;
            _ = &mut shutdown => return Ok(()),
            chunk = body.next() => chunk,
        };

        let bytes = match chunk {
            Some(Ok(bytes)) => bytes,
            Some(Err(source)) => return Err(ClientError::Transport { operation, source }),
            None => return Ok(()),
        };

        for event in decoder.feed(&bytes) {
            if context.closed.load(Ordering::Acquire) {
                return Ok(());
            }
            if !event.is_message() {
                tracing::trace!(scope = %context.label, event = ?event.event, "Ignoring named event");
                continue;
            }

            match serde_json::from_str::<Image>(&event.data) {
                Ok(image) => {
                    context.counters.delivered.fetch_add(1, Ordering::Relaxed);
                    on_message(image);
                }
                Err(error) => {
                    context.counters.skipped.fetch_add(1, Ordering::Relaxed);
                    log_stream_event_skipped(&context.label, &error, &event.data);
                }
            }
        }
    }
}
