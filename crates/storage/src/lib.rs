#![forbid(unsafe_code)]

pub mod keys;
pub mod repository;
pub mod sqlite;

pub use keys::ProgressScope;
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
