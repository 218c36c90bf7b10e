//! Structured logging for the henkan client
//!
//! Library code logs through these helpers so every record carries the same
//! `operation` / `image_id` fields. The binary installs the subscriber.

use tracing_subscriber::EnvFilter;

use crate::shared::errors::{ApiOperation, ClientError};

/// Log categories
#[derive(Debug, Clone, Copy)]
pub enum LogOperation {
    Request,
    Stream,
    Storage,
    State,
}

impl LogOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogOperation::Request => "request",
            LogOperation::Stream => "stream",
            LogOperation::Storage => "storage",
            LogOperation::State => "state",
        }
    }
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` picks the level
/// (0 = warn, 1 = info, 2 = debug, 3+ = trace).
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("henkan_client={default_level},henkan={default_level}")));

    // try_init: tests and embedders may already own the global subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log an outgoing REST call
pub fn log_request_start(operation: ApiOperation, url: &str) {
    tracing::debug!(
        operation = LogOperation::Request.as_str(),
        api_operation = operation.as_str(),
        url = url,
        "Sending request"
    );
}

/// Log a completed REST call
pub fn log_request_success(operation: ApiOperation, status: u16) {
    tracing::debug!(
        operation = LogOperation::Request.as_str(),
        api_operation = operation.as_str(),
        status = status,
        "Request completed"
    );
}

/// Log a failed REST call
pub fn log_request_failure(error: &ClientError) {
    tracing::warn!(
        operation = LogOperation::Request.as_str(),
        api_operation = error.operation().map(|op| op.as_str()).unwrap_or("none"),
        error = %error,
        "Request failed"
    );
}

/// Log input rejected before a request
pub fn log_validation_failure(operation: ApiOperation, error: &ClientError) {
    tracing::debug!(
        operation = LogOperation::Request.as_str(),
        api_operation = operation.as_str(),
        error = %error,
        "Request rejected by client-side validation"
    );
}

/// Log stream connection established
pub fn log_stream_opened(scope: &str, url: &str) {
    tracing::info!(
        operation = LogOperation::Stream.as_str(),
        scope = scope,
        url = url,
        "Event stream connected"
    );
}

/// Log a malformed stream payload that was skipped
pub fn log_stream_event_skipped(scope: &str, error: &serde_json::Error, payload: &str) {
    tracing::warn!(
        operation = LogOperation::Stream.as_str(),
        scope = scope,
        error = %error,
        payload = &payload[..floor_char_boundary(payload, 200)],
        "Skipped malformed event payload"
    );
}

/// Log a stream ending on its own (server closed or transport failure)
pub fn log_stream_ended(scope: &str, error: Option<&ClientError>) {
    match error {
        Some(error) => tracing::warn!(
            operation = LogOperation::Stream.as_str(),
            scope = scope,
            error = %error,
            "Event stream failed"
        ),
        None => tracing::info!(
            operation = LogOperation::Stream.as_str(),
            scope = scope,
            "Event stream ended by server"
        ),
    }
}

/// Log an explicit close
pub fn log_stream_closed(scope: &str, delivered: u64, skipped: u64) {
    tracing::info!(
        operation = LogOperation::Stream.as_str(),
        scope = scope,
        delivered = delivered,
        skipped = skipped,
        "Event stream closed"
    );
}

/// Log a subscription handle dropped without close
pub fn log_stream_leaked(scope: &str) {
    tracing::warn!(
        operation = LogOperation::Stream.as_str(),
        scope = scope,
        "Subscription dropped without close; tearing connection down"
    );
}

/// Log a stored transformation step kept as unsupported
pub fn log_unsupported_transformation(name: &str, error: &serde_json::Error) {
    tracing::warn!(
        operation = LogOperation::State.as_str(),
        transformation = name,
        error = %error,
        "Keeping unsupported transformation from a stored record"
    );
}

/// Log object retrieval
pub fn log_object_fetch(key: &str, bytes: usize) {
    tracing::debug!(
        operation = LogOperation::Storage.as_str(),
        key = key,
        bytes = bytes,
        "Fetched object"
    );
}

/// Log a pushed update that did not match the state it was applied to
pub fn log_update_ignored(view: &str, expected_id: &str, received_id: &str) {
    tracing::debug!(
        operation = LogOperation::State.as_str(),
        view = view,
        expected_id = expected_id,
        received_id = received_id,
        "Ignored update for another image"
    );
}

/// Log a failed supplementary load (e.g. metadata)
pub fn log_optional_load_failure(view: &str, image_id: &str, error: &ClientError) {
    tracing::warn!(
        operation = LogOperation::State.as_str(),
        view = view,
        image_id = image_id,
        error = %error,
        "Optional data unavailable"
    );
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}
