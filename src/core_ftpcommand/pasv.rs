use crate::core_ftpcommand::utils::{reply, CommandContext, Flow};
use crate::core_network::pasv::PassiveDataChannel;
use crate::core_protocol::codes::{
    CANT_OPEN_DATA_CONNECTION, ENTERING_EXTENDED_PASSIVE, ENTERING_PASSIVE, SYNTAX_ERROR_ARGS,
};
use crate::core_protocol::passive::{encode_epsv, encode_pasv};
use crate::core_protocol::Response;
use crate::session::Session;
use log::{error, info};
use std::net::IpAddr;
use tokio::io::AsyncWrite;

/// Closes the session's current channel, then opens a listener on the control
/// connection's local address.
async fn open_channel(
    ctx: &CommandContext,
    session: &mut Session,
) -> Result<PassiveDataChannel, Response> {
    session.close_data_channel();
    let server = &ctx.config.server;
    let bind_ip = session.local_addr().ip().to_canonical();
    match PassiveDataChannel::open(bind_ip, server.pasv_port_range()).await {
        Ok(channel) => Ok(channel
            .with_idle_timeout(server.data_idle_timeout())
            .with_buffer_size(server.transfer_buffer_size)
            .with_max_receive_size(server.max_upload_size)),
        Err(e) => {
            error!("Failed to open passive listener on {}: {}", bind_ip, e);
            Err(e.to_ftp_response())
        }
    }
}

/// Handles the PASV FTP command.
///
/// The advertised address is `pasv_address` from the configuration, or the
/// local address of the control connection. PASV can only express IPv4, so
/// it is refused on an IPv6 control connection.
///
/// # Arguments
///
/// * `writer` - The control connection.
/// * `ctx` - Shared server configuration and storage.
/// * `session` - The session that will own the channel.
///
/// # Returns
///
/// Result<Flow, std::io::Error>, an error only if the reply could not be written.
pub async fn handle_pasv_command<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &mut Session,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    let advertised = match (ctx.config.server.pasv_address, session.local_addr().ip().to_canonical()) {
        (Some(addr), _) => addr,
        (None, IpAddr::V4(addr)) => addr,
        (None, IpAddr::V6(_)) => {
            return reply(
                writer,
                Response::new(CANT_OPEN_DATA_CONNECTION, "PASV is not available over IPv6, use EPSV."),
            )
            .await;
        }
    };

    let channel = match open_channel(ctx, session).await {
        Ok(channel) => channel,
        Err(response) => return reply(writer, response).await,
    };
    let port = channel.local_addr().port();
    session.set_data_channel(channel);

    info!("PASV for {}: {}:{}", session.peer_addr(), advertised, port);
    reply(writer, Response::new(ENTERING_PASSIVE, encode_pasv(advertised, port))).await
}

/// Handles the EPSV FTP command.
///
/// Only the port is advertised; the client reuses the control connection's
/// host. `EPSV 1`, `EPSV 2` and `EPSV ALL` are accepted.
pub async fn handle_epsv_command<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &mut Session,
    arg: Option<String>,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    if let Some(arg) = arg.as_deref() {
        if !matches!(arg.to_ascii_uppercase().as_str(), "1" | "2" | "ALL") {
            return reply(
                writer,
                Response::new(SYNTAX_ERROR_ARGS, "Unsupported network protocol, use (1,2)."),
            )
            .await;
        }
    }

    let channel = match open_channel(ctx, session).await {
        Ok(channel) => channel,
        Err(response) => return reply(writer, response).await,
    };
    let port = channel.local_addr().port();
    session.set_data_channel(channel);

    info!("EPSV for {}: port {}", session.peer_addr(), port);
    reply(writer, Response::new(ENTERING_EXTENDED_PASSIVE, encode_epsv(port))).await
}
