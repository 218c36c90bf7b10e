// Adapters to external collaborators (image API, object store)

pub mod api;
pub mod storage;
