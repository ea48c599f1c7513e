//! Control-channel wire format shared by the server and the client.

pub mod codes;
pub mod error;
pub mod passive;
pub mod response;

pub use error::{PassiveReplyError, ProtocolError};
pub use response::{format_line, format_response, parse_complete, ParseOutcome, Response, ResponseLine};
