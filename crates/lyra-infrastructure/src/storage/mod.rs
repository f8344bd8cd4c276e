//! Storage primitives for local client state.

mod record_storage;

pub use record_storage::{RecordStorage, RecordStorageError};
