//! sandftp: a passive-mode FTP server confined to one directory, and the
//! matching client.
//!
//! The server side is [`server::FtpServer`]; every control connection gets a
//! [`session::Session`] and commands are dispatched by
//! [`core_ftpcommand::handlers::handle_command`]. The client side is
//! [`core_client::FtpClient`].

pub mod config;
pub mod constants;
pub mod core_cli;
pub mod core_client;
pub mod core_ftpcommand;
pub mod core_log;
pub mod core_network;
pub mod core_path;
pub mod core_protocol;
pub mod core_storage;
pub mod helpers;
pub mod server;
pub mod session;

pub use config::Config;
