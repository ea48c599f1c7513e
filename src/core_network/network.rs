use crate::constants::{GREETING, MAX_COMMAND_LENGTH};
use crate::core_ftpcommand::handlers::handle_command;
use crate::core_ftpcommand::utils::{CommandContext, Flow};
use crate::core_path::PathResolver;
use crate::core_protocol::codes::{SERVICE_NOT_AVAILABLE, SERVICE_READY, SYNTAX_ERROR};
use crate::core_protocol::Response;
use crate::helpers::send_response;
use crate::session::Session;
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

/// Outcome of reading one command line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineRead {
    Line(String),
    /// The line exceeded the limit; it has been consumed and discarded.
    TooLong,
    Eof,
}

/// Reads one LF-terminated line of at most `max_len` bytes, CR stripped.
///
/// Longer lines are drained up to their terminator so the next read starts
/// on a fresh command.
pub async fn read_command_line<R>(reader: &mut R, max_len: usize) -> std::io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut too_long = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(LineRead::Eof);
        }

        let (chunk, done) = match available.iter().position(|&b| b == b'\n') {
            Some(idx) => (&available[..idx], idx + 1),
            None => (available, available.len()),
        };
        let found_terminator = done != chunk.len();
        if !too_long {
            if line.len() + chunk.len() > max_len + 1 {
                too_long = true;
                line.clear();
            } else {
                line.extend_from_slice(chunk);
            }
        }
        reader.consume(done);

        if found_terminator {
            break;
        }
    }

    if line.last() == Some(&b'\r') {
        line.pop();
    }
    if too_long || line.len() > max_len {
        return Ok(LineRead::TooLong);
    }
    Ok(LineRead::Line(String::from_utf8_lossy(&line).into_owned()))
}

/// Accepts control connections until the listener fails.
///
/// Each connection runs in its own task holding one permit of `limit`; when
/// none is left the client gets `421` and is disconnected.
pub async fn accept_connections(
    listener: TcpListener,
    ctx: CommandContext,
    resolver: PathResolver,
    limit: Arc<Semaphore>,
) -> Result<()> {
    loop {
        let (socket, addr) = listener
            .accept()
            .await
            .context("Failed to accept control connection")?;

        let permit = match Arc::clone(&limit).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!("Refusing {}: too many connections", addr);
                tokio::spawn(async move {
                    let mut socket = socket;
                    let response = Response::new(
                        SERVICE_NOT_AVAILABLE,
                        "Too many connections, try again later.",
                    );
                    if let Err(e) = send_response(&mut socket, &response).await {
                        debug!("Failed to send 421 to {}: {}", addr, e);
                    }
                });
                continue;
            }
        };

        info!("New connection from {}", addr);
        let ctx = ctx.clone();
        let resolver = resolver.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, ctx, resolver).await {
                error!("Connection error with {}: {:?}", addr, e);
            }
            info!("Connection closed for {}", addr);
            drop(permit);
        });
    }
}

/// Serves one control connection from greeting to QUIT, EOF or idle timeout.
pub async fn handle_connection(
    socket: TcpStream,
    ctx: CommandContext,
    resolver: PathResolver,
) -> Result<()> {
    let peer_addr = socket.peer_addr().context("Control connection has no peer")?;
    let local_addr = socket.local_addr().context("Control connection has no local address")?;
    let (read_half, mut writer) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut session = Session::new(resolver, peer_addr, local_addr);

    let banner_lines = ctx
        .config
        .server
        .banner
        .as_deref()
        .map(|banner| banner.lines().map(str::to_string).collect::<Vec<_>>())
        .unwrap_or_default();
    let greeting = Response::multi(
        SERVICE_READY,
        banner_lines.into_iter().chain(std::iter::once(GREETING.to_string())),
    );
    send_response(&mut writer, &greeting).await?;

    let idle_timeout = ctx.config.server.idle_timeout();
    loop {
        let read = tokio::time::timeout(
            idle_timeout,
            read_command_line(&mut reader, MAX_COMMAND_LENGTH),
        )
        .await;

        let line = match read {
            Err(_) => {
                info!("Idle timeout for {}", peer_addr);
                let response = Response::new(
                    SERVICE_NOT_AVAILABLE,
                    "Idle timeout, closing control connection.",
                );
                send_response(&mut writer, &response).await?;
                break;
            }
            Ok(Err(e)) => return Err(e).context("Failed to read from control connection"),
            Ok(Ok(LineRead::Eof)) => {
                debug!("Client {} disconnected", peer_addr);
                break;
            }
            Ok(Ok(LineRead::TooLong)) => {
                warn!("Command line from {} too long", peer_addr);
                send_response(&mut writer, &Response::new(SYNTAX_ERROR, "Command line too long."))
                    .await?;
                continue;
            }
            Ok(Ok(LineRead::Line(line))) => line,
        };

        match handle_command(&mut writer, &ctx, &mut session, &line).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Close) => break,
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to reply to {}", peer_addr));
            }
        }
    }

    session.close_data_channel();
    Ok(())
}
