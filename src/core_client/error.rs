use crate::core_protocol::{PassiveReplyError, ProtocolError};
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed by the server")]
    ConnectionClosed,

    #[error("{command} rejected: {code} {message}")]
    Rejected {
        command: String,
        code: u16,
        message: String,
    },

    #[error("bad passive-mode reply: {0}")]
    Passive(#[from] PassiveReplyError),

    #[error("invalid URL: {0}")]
    Url(String),
}

impl ClientError {
    /// Reply code of a rejected command.
    pub fn code(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}
