use crate::core_storage::error::StorageError;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// Physical access to the files behind the sandbox.
///
/// Every path handed to a backend has already been resolved inside the root,
/// so implementations never see virtual paths.
pub trait StorageBackend: Send + Sync {
    fn entry_kind<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, EntryKind>;

    /// `ls -l` style listing, one CRLF-terminated line per entry. Listing a
    /// file yields the line for that file.
    fn list_entries<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, String>;

    /// Bare names, one CRLF-terminated line per entry.
    fn list_names<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, String>;

    fn read_file<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, Vec<u8>>;

    /// Creates or truncates `path`. Returns the number of bytes written.
    fn write_file<'a>(&'a self, path: &'a Path, data: &'a [u8]) -> StorageFuture<'a, u64>;

    fn delete_file<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, ()>;

    fn make_directory<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, ()>;

    /// Fails with [`StorageError::DirectoryNotEmpty`] unless the directory is empty.
    fn remove_directory<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, ()>;

    /// Fails with [`StorageError::AlreadyExists`] if `to` exists.
    fn rename<'a>(&'a self, from: &'a Path, to: &'a Path) -> StorageFuture<'a, ()>;

    fn size<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, u64>;

    fn modified_time<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, DateTime<Utc>>;
}
