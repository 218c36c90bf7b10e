//! Incremental `text/event-stream` decoder
//!
//! Bytes arrive in arbitrary chunks; the decoder buffers partial lines and
//! emits complete events as blank lines dispatch them. Field handling follows
//! the EventSource processing model: `data` lines accumulate, `event` names
//! the event, `id` persists across events, comments (`:`) are dropped and an
//! event without data is never dispatched.

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// `None` means the default `message` type
    pub event: Option<String>,
    pub data: String,
    /// Last event id seen on the stream
    pub id: Option<String>,
    pub retry: Option<u64>,
}

impl SseEvent {
    /// Would fire an `EventSource.onmessage` handler
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    line: Vec<u8>,
    // previous chunk ended in '\r'; swallow a leading '\n'
    skip_lf: bool,
    data: String,
    event: Option<String>,
    last_event_id: Option<String>,
    retry: Option<u64>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk, returning every event it completes, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();

        for &byte in chunk {
            if self.skip_lf {
                self.skip_lf = false;
                if byte == b'\n' {
                    continue;
                }
            }
            match byte {
                b'\r' => {
                    self.skip_lf = true;
                    self.end_line(&mut events);
                }
                b'\n' => self.end_line(&mut events),
                _ => self.line.push(byte),
            }
        }

        events
    }

    fn end_line(&mut self, events: &mut Vec<SseEvent>) {
        let raw = std::mem::take(&mut self.line);
        let line = String::from_utf8_lossy(&raw);

        if line.is_empty() {
            if let Some(event) = self.dispatch() {
                events.push(event);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_ref(), ""),
        };

        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "event" => self.event = Some(value.to_string()),
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    self.retry = value.parse().ok();
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take().filter(|name| !name.is_empty());
        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }

        Some(SseEvent {
            event,
            data,
            id: self.last_event_id.clone(),
            retry: self.retry,
        })
    }
}
