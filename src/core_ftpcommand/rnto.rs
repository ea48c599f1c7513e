use crate::core_ftpcommand::utils::{reply, CommandContext, Flow};
use crate::core_protocol::codes::{BAD_SEQUENCE, FILE_ACTION_OK};
use crate::core_protocol::Response;
use crate::session::Session;
use log::{info, warn};
use tokio::io::AsyncWrite;

/// Handles the RNTO (Rename To) FTP command.
///
/// Needs a pending RNFR; the pending source is consumed whatever the outcome,
/// so a second RNTO gets `503`. An existing destination is never replaced.
///
/// # Arguments
///
/// * `writer` - The control connection.
/// * `ctx` - Shared server configuration and storage.
/// * `session` - The session holding the pending rename.
/// * `arg` - The new name.
///
/// # Returns
///
/// Result<Flow, std::io::Error>, an error only if the reply could not be written.
pub async fn handle_rnto_command<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &mut Session,
    arg: String,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    let source = match session.take_rename_pending() {
        Some(source) => source,
        None => return reply(writer, Response::new(BAD_SEQUENCE, "Bad sequence of commands.")).await,
    };

    let (from, to) = match (session.resolve_entry(&source), session.resolve_entry(&arg)) {
        (Ok(from), Ok(to)) => (from, to),
        (Err(e), _) | (_, Err(e)) => return reply(writer, e.to_ftp_response()).await,
    };

    match ctx.storage.rename(&from, &to).await {
        Ok(()) => {
            info!("Renamed {:?} to {:?}", from, to);
            reply(writer, Response::new(FILE_ACTION_OK, "Rename successful.")).await
        }
        Err(e) => {
            warn!("Rename of {:?} to {:?} failed: {}", from, to, e);
            reply(writer, e.to_ftp_response()).await
        }
    }
}
