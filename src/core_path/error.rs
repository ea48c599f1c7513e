// Errors raised when a virtual path cannot be mapped inside the root
use crate::core_protocol::codes::FILE_UNAVAILABLE;
use crate::core_protocol::Response;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathSecurityError {
    #[error("path escapes the sandbox root")]
    EscapesRoot,

    #[error("path contains a NUL byte")]
    InvalidPath,

    #[error("path cannot be resolved: {0}")]
    Unresolvable(#[from] io::Error),
}

impl PathSecurityError {
    /// One reply for every variant; real paths never reach the client.
    pub fn to_ftp_response(&self) -> Response {
        Response::new(FILE_UNAVAILABLE, "Permission denied.")
    }
}
