// Decoding helpers

pub mod sse_parser;

pub use sse_parser::{SseDecoder, SseEvent};
