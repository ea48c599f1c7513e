//! Storage collaborator: physical file access and directory listings.

pub mod backend;
pub mod error;
pub mod listing;
pub mod local;

pub use backend::{EntryKind, StorageBackend, StorageFuture};
pub use error::StorageError;
pub use local::LocalStorage;
