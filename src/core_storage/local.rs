use crate::core_storage::backend::{EntryKind, StorageBackend, StorageFuture};
use crate::core_storage::error::StorageError;
use crate::core_storage::listing::{format_entry, join_lines};
use chrono::{DateTime, Utc};
use filetime::FileTime;
use log::{debug, warn};
use std::path::Path;
use tokio::fs;

/// Storage on the local filesystem.
///
/// Containment is the job of the path resolver; this type only performs the
/// operations and turns their failures into [`StorageError`]s.
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    async fn listing(path: &Path, long: bool) -> Result<String, StorageError> {
        let metadata = fs::metadata(path).await?;
        if !metadata.is_dir() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let line = if long { format_entry(&name, &metadata) } else { name };
            return Ok(join_lines(&[line]));
        }

        let mut entries = Vec::new();
        let mut dir = fs::read_dir(path).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !long {
                entries.push((name.clone(), name));
                continue;
            }
            match entry.metadata().await {
                Ok(metadata) => {
                    let line = format_entry(&name, &metadata);
                    entries.push((name, line));
                }
                Err(e) => warn!("Skipping {:?} in listing: {}", entry.path(), e),
            }
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let lines: Vec<String> = entries.into_iter().map(|(_, line)| line).collect();
        debug!("Listed {} entries in {:?}", lines.len(), path);
        Ok(join_lines(&lines))
    }
}

impl StorageBackend for LocalStorage {
    fn entry_kind<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, EntryKind> {
        Box::pin(async move {
            let metadata = fs::metadata(path).await?;
            Ok(if metadata.is_dir() {
                EntryKind::Directory
            } else if metadata.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            })
        })
    }

    fn list_entries<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, String> {
        Box::pin(Self::listing(path, true))
    }

    fn list_names<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, String> {
        Box::pin(Self::listing(path, false))
    }

    fn read_file<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, Vec<u8>> {
        Box::pin(async move {
            if fs::metadata(path).await?.is_dir() {
                return Err(StorageError::IsDirectory);
            }
            Ok(fs::read(path).await?)
        })
    }

    fn write_file<'a>(&'a self, path: &'a Path, data: &'a [u8]) -> StorageFuture<'a, u64> {
        Box::pin(async move {
            if let Ok(metadata) = fs::metadata(path).await {
                if metadata.is_dir() {
                    return Err(StorageError::IsDirectory);
                }
            }
            fs::write(path, data).await?;
            Ok(data.len() as u64)
        })
    }

    fn delete_file<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            if fs::symlink_metadata(path).await?.is_dir() {
                return Err(StorageError::IsDirectory);
            }
            Ok(fs::remove_file(path).await?)
        })
    }

    fn make_directory<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, ()> {
        Box::pin(async move { Ok(fs::create_dir(path).await?) })
    }

    fn remove_directory<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            if !fs::symlink_metadata(path).await?.is_dir() {
                return Err(StorageError::NotADirectory);
            }
            if fs::read_dir(path).await?.next_entry().await?.is_some() {
                return Err(StorageError::DirectoryNotEmpty);
            }
            Ok(fs::remove_dir(path).await?)
        })
    }

    fn rename<'a>(&'a self, from: &'a Path, to: &'a Path) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            fs::symlink_metadata(from).await?;
            if fs::symlink_metadata(to).await.is_ok() {
                return Err(StorageError::AlreadyExists);
            }
            Ok(fs::rename(from, to).await?)
        })
    }

    fn size<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, u64> {
        Box::pin(async move {
            let metadata = fs::metadata(path).await?;
            if metadata.is_dir() {
                return Err(StorageError::IsDirectory);
            }
            Ok(metadata.len())
        })
    }

    fn modified_time<'a>(&'a self, path: &'a Path) -> StorageFuture<'a, DateTime<Utc>> {
        Box::pin(async move {
            let metadata = fs::metadata(path).await?;
            let mtime = FileTime::from_last_modification_time(&metadata);
            DateTime::<Utc>::from_timestamp(mtime.unix_seconds(), mtime.nanoseconds()).ok_or_else(
                || {
                    StorageError::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "modification time out of range",
                    ))
                },
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs as stdfs;

    fn storage() -> (tempfile::TempDir, LocalStorage) {
        let tmp = tempfile::tempdir().unwrap();
        stdfs::create_dir(tmp.path().join("dir")).unwrap();
        stdfs::write(tmp.path().join("dir/b.txt"), b"bbb").unwrap();
        stdfs::write(tmp.path().join("a.txt"), b"hello").unwrap();
        (tmp, LocalStorage::new())
    }

    #[tokio::test]
    async fn test_read_and_write() {
        let (tmp, storage) = storage();
        let path = tmp.path().join("new.bin");
        let data: Vec<u8> = (0..=255u8).collect();

        assert_eq!(storage.write_file(&path, &data).await.unwrap(), 256);
        assert_eq!(storage.read_file(&path).await.unwrap(), data);
        assert!(matches!(
            storage.read_file(&tmp.path().join("missing")).await,
            Err(StorageError::NotFound)
        ));
        assert!(matches!(
            storage.read_file(&tmp.path().join("dir")).await,
            Err(StorageError::IsDirectory)
        ));
    }

    #[tokio::test]
    async fn test_write_does_not_create_parents() {
        let (tmp, storage) = storage();
        let path = tmp.path().join("no/such/parent.txt");
        assert!(matches!(
            storage.write_file(&path, b"x").await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_listing_is_sorted() {
        let (tmp, storage) = storage();
        let listing = storage.list_entries(tmp.path()).await.unwrap();
        let lines: Vec<&str> = listing.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" a.txt"));
        assert!(lines[0].starts_with('-'));
        assert!(lines[1].ends_with(" dir"));
        assert!(lines[1].starts_with('d'));

        let names = storage.list_names(tmp.path()).await.unwrap();
        assert_eq!(names, "a.txt\r\ndir\r\n");

        let single = storage.list_names(&tmp.path().join("a.txt")).await.unwrap();
        assert_eq!(single, "a.txt\r\n");
    }

    #[tokio::test]
    async fn test_empty_directory_lists_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let listing = LocalStorage::new().list_entries(tmp.path()).await.unwrap();
        assert!(listing.is_empty());
    }

    #[tokio::test]
    async fn test_directory_operations() {
        let (tmp, storage) = storage();
        let dir = tmp.path().join("dir");

        assert!(matches!(
            storage.make_directory(&dir).await,
            Err(StorageError::AlreadyExists)
        ));
        assert!(matches!(
            storage.remove_directory(&dir).await,
            Err(StorageError::DirectoryNotEmpty)
        ));
        assert!(matches!(
            storage.remove_directory(&tmp.path().join("a.txt")).await,
            Err(StorageError::NotADirectory)
        ));
        assert!(matches!(
            storage.delete_file(&dir).await,
            Err(StorageError::IsDirectory)
        ));

        storage.delete_file(&dir.join("b.txt")).await.unwrap();
        storage.remove_directory(&dir).await.unwrap();
        assert!(!dir.exists());

        storage.make_directory(&dir).await.unwrap();
        assert_eq!(storage.entry_kind(&dir).await.unwrap(), EntryKind::Directory);
    }

    #[tokio::test]
    async fn test_rename_refuses_to_overwrite() {
        let (tmp, storage) = storage();
        let from = tmp.path().join("a.txt");
        let to = tmp.path().join("c.txt");

        assert!(matches!(
            storage.rename(&from, &tmp.path().join("dir")).await,
            Err(StorageError::AlreadyExists)
        ));
        assert!(matches!(
            storage.rename(&tmp.path().join("missing"), &to).await,
            Err(StorageError::NotFound)
        ));

        storage.rename(&from, &to).await.unwrap();
        assert!(!from.exists());
        assert_eq!(stdfs::read(&to).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_size_and_modified_time() {
        let (tmp, storage) = storage();
        let path = tmp.path().join("a.txt");
        assert_eq!(storage.size(&path).await.unwrap(), 5);
        assert!(matches!(
            storage.size(&tmp.path().join("dir")).await,
            Err(StorageError::IsDirectory)
        ));

        let stamp = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(stamp.timestamp(), 0)).unwrap();
        assert_eq!(storage.modified_time(&path).await.unwrap(), stamp);
    }
}
