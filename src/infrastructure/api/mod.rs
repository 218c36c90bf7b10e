// Remote image service adapters
// REST calls and the event-stream bridge

pub mod client;
pub mod sse;

pub use client::ImageApiClient;
pub use sse::{StreamScope, StreamStats, Subscription};
