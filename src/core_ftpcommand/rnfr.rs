use crate::core_ftpcommand::utils::{reply, CommandContext, Flow};
use crate::core_protocol::codes::PENDING_FURTHER_INFO;
use crate::core_protocol::Response;
use crate::session::Session;
use log::{debug, warn};
use tokio::io::AsyncWrite;

/// Handles the RNFR (Rename From) FTP command.
///
/// Remembers the source for the following RNTO. The source must resolve
/// inside the root and exist; otherwise no rename is pending afterwards.
///
/// # Arguments
///
/// * `writer` - The control connection.
/// * `ctx` - Shared server configuration and storage.
/// * `session` - The session that keeps the pending rename.
/// * `arg` - The current name of the file or directory.
///
/// # Returns
///
/// Result<Flow, std::io::Error>, an error only if the reply could not be written.
pub async fn handle_rnfr_command<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &mut Session,
    arg: String,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    session.take_rename_pending();

    let path = match session.resolve_entry(&arg) {
        Ok(path) => path,
        Err(e) => return reply(writer, e.to_ftp_response()).await,
    };
    if let Err(e) = ctx.storage.entry_kind(&path).await {
        warn!("RNFR {:?}: {}", arg, e);
        return reply(writer, e.to_ftp_response()).await;
    }

    let source = session.virtual_path(&arg);
    debug!("Rename pending from {}", source);
    session.set_rename_pending(source);
    reply(writer, Response::new(PENDING_FURTHER_INFO, "Ready for RNTO.")).await
}
