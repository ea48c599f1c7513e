// Errors raised while framing or decoding control-channel replies
use thiserror::Error;

/// Malformed reply framing. Fatal for the connection, never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed reply line: {0:?}")]
    MalformedLine(String),

    #[error("reply code {0} is out of range")]
    InvalidCode(u16),

    #[error("reply code {found} inside a multi-line {expected} reply")]
    UnexpectedCode { expected: u16, found: u16 },

    #[error("reply line is not valid UTF-8")]
    InvalidEncoding,
}

impl ProtocolError {
    pub(crate) fn malformed(line: &str) -> Self {
        let preview: String = line.chars().take(64).collect();
        ProtocolError::MalformedLine(preview)
    }
}

/// A 227/229 reply whose address could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PassiveReplyError {
    #[error("no host/port tuple in passive reply: {0:?}")]
    MissingAddress(String),

    #[error("invalid number in passive reply: {0}")]
    InvalidNumber(String),

    #[error("malformed extended passive reply: {0:?}")]
    MalformedExtended(String),
}
