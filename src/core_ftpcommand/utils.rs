use crate::config::Config;
use crate::core_network::pasv::{DataConnectionError, PassiveDataChannel};
use crate::core_protocol::codes::{OPENING_DATA_CONNECTION, TRANSFER_COMPLETE};
use crate::core_protocol::Response;
use crate::core_storage::StorageBackend;
use crate::helpers::send_response;
use crate::session::{Session, TransferType};
use log::{info, warn};
use std::sync::Arc;
use tokio::io::AsyncWrite;

/// What the connection loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Server-wide collaborators shared by every connection.
#[derive(Clone)]
pub struct CommandContext {
    pub config: Arc<Config>,
    pub storage: Arc<dyn StorageBackend>,
}

impl CommandContext {
    pub fn new(config: Arc<Config>, storage: Arc<dyn StorageBackend>) -> Self {
        Self { config, storage }
    }
}

/// Doubles embedded quotes for a `257` reply.
pub fn quote_path(path: &str) -> String {
    format!("\"{}\"", path.replace('"', "\"\""))
}

/// Sends `response` and keeps the connection going.
pub async fn reply<W>(writer: &mut W, response: Response) -> std::io::Result<Flow>
where
    W: AsyncWrite + Unpin + Send,
{
    send_response(writer, &response).await?;
    Ok(Flow::Continue)
}

/// Closes `channel` and answers with `response`. Used when a transfer fails
/// before anything was announced on the control connection.
pub async fn abandon_transfer<W>(
    writer: &mut W,
    mut channel: PassiveDataChannel,
    response: Response,
) -> std::io::Result<Flow>
where
    W: AsyncWrite + Unpin + Send,
{
    channel.close();
    reply(writer, response).await
}

/// Announces the transfer with `150` and waits for the client to connect.
///
/// Returns `false` when no peer showed up; the failure has been answered and
/// the channel is closed.
pub async fn begin_transfer<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &Session,
    channel: &mut PassiveDataChannel,
    what: &str,
) -> std::io::Result<bool>
where
    W: AsyncWrite + Unpin + Send,
{
    let mode = match session.transfer_type() {
        TransferType::Ascii => "ASCII",
        TransferType::Binary => "BINARY",
    };
    send_response(
        writer,
        &Response::new(
            OPENING_DATA_CONNECTION,
            format!("Opening {} mode data connection for {}.", mode, what),
        ),
    )
    .await?;

    let expected_peer = ctx
        .config
        .server
        .pasv_peer_check
        .then(|| session.peer_addr().ip());
    match channel
        .await_peer(ctx.config.server.data_timeout(), expected_peer)
        .await
    {
        Ok(_) => Ok(true),
        Err(e) => {
            warn!("Data connection for {} failed: {}", session.peer_addr(), e);
            channel.close();
            send_response(writer, &e.to_ftp_response()).await?;
            Ok(false)
        }
    }
}

/// Closes `channel` and reports the outcome of the transfer.
pub async fn end_transfer<W>(
    writer: &mut W,
    session: &Session,
    mut channel: PassiveDataChannel,
    outcome: Result<u64, DataConnectionError>,
) -> std::io::Result<Flow>
where
    W: AsyncWrite + Unpin + Send,
{
    channel.close();
    match outcome {
        Ok(bytes) => {
            info!("Transfer of {} bytes to/from {} complete", bytes, session.peer_addr());
            reply(writer, Response::new(TRANSFER_COMPLETE, "Transfer complete.")).await
        }
        Err(e) => {
            warn!("Transfer with {} aborted: {}", session.peer_addr(), e);
            reply(writer, e.to_ftp_response()).await
        }
    }
}
