// Errors for the storage backend
use crate::core_protocol::codes::{FILE_NAME_NOT_ALLOWED, FILE_UNAVAILABLE, LOCAL_ERROR};
use crate::core_protocol::Response;
use std::io::{self, ErrorKind};
use thiserror::Error;

/// Failures reported by a [`StorageBackend`](crate::core_storage::StorageBackend).
///
/// Variants carry no path.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("no such file or directory")]
    NotFound,

    #[error("is a directory")]
    IsDirectory,

    #[error("not a directory")]
    NotADirectory,

    #[error("permission denied")]
    PermissionDenied,

    #[error("already exists")]
    AlreadyExists,

    #[error("directory not empty")]
    DirectoryNotEmpty,

    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            ErrorKind::NotFound => StorageError::NotFound,
            ErrorKind::PermissionDenied => StorageError::PermissionDenied,
            ErrorKind::AlreadyExists => StorageError::AlreadyExists,
            _ => StorageError::Io(error),
        }
    }
}

impl StorageError {
    pub fn to_ftp_response(&self) -> Response {
        match self {
            StorageError::NotFound => Response::new(FILE_UNAVAILABLE, "No such file or directory."),
            StorageError::IsDirectory => Response::new(FILE_UNAVAILABLE, "Is a directory."),
            StorageError::NotADirectory => Response::new(FILE_UNAVAILABLE, "Not a directory."),
            StorageError::PermissionDenied => Response::new(FILE_UNAVAILABLE, "Permission denied."),
            StorageError::AlreadyExists => {
                Response::new(FILE_NAME_NOT_ALLOWED, "File name not allowed: already exists.")
            }
            StorageError::DirectoryNotEmpty => Response::new(FILE_UNAVAILABLE, "Directory not empty."),
            StorageError::Io(_) => {
                Response::new(LOCAL_ERROR, "Requested action aborted. Local error in processing.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kinds_map_to_variants() {
        let err: StorageError = io::Error::from(ErrorKind::NotFound).into();
        assert!(matches!(err, StorageError::NotFound));
        let err: StorageError = io::Error::from(ErrorKind::PermissionDenied).into();
        assert!(matches!(err, StorageError::PermissionDenied));
        let err: StorageError = io::Error::from(ErrorKind::AlreadyExists).into();
        assert!(matches!(err, StorageError::AlreadyExists));
        let err: StorageError = io::Error::from(ErrorKind::Interrupted).into();
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn test_replies() {
        assert_eq!(StorageError::NotFound.to_ftp_response().code, 550);
        assert_eq!(StorageError::AlreadyExists.to_ftp_response().code, 553);
        assert_eq!(
            StorageError::Io(io::Error::from(ErrorKind::Interrupted)).to_ftp_response().code,
            451
        );
    }
}
