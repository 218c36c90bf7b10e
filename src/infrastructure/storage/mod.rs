// Object store access (original and transformed image bytes)

pub mod object_store;

pub use object_store::ObjectStorage;
