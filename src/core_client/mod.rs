//! Client side of the protocol: a control connection, passive data channels
//! and the operations built on them.

pub mod connection;
pub mod data;
pub mod driver;
pub mod error;

pub use driver::{ClientConfig, FtpClient};
pub use error::ClientError;
