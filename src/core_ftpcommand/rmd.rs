use crate::core_ftpcommand::utils::{reply, CommandContext, Flow};
use crate::core_path::PathSecurityError;
use crate::core_protocol::codes::FILE_ACTION_OK;
use crate::core_protocol::Response;
use crate::session::Session;
use log::{info, warn};
use tokio::io::AsyncWrite;

/// Handles the RMD (Remove Directory) FTP command.
///
/// Only empty directories are removed. The root itself can never be removed.
pub async fn handle_rmd_command<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &mut Session,
    arg: String,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    let path = match session.resolve_entry(&arg) {
        Ok(path) => path,
        Err(e) => return reply(writer, e.to_ftp_response()).await,
    };
    if path == session.resolver().root() {
        warn!("Refusing to remove the root directory");
        return reply(writer, PathSecurityError::EscapesRoot.to_ftp_response()).await;
    }

    match ctx.storage.remove_directory(&path).await {
        Ok(()) => {
            info!("Directory removed: {:?}", path);
            reply(writer, Response::new(FILE_ACTION_OK, "Directory removed.")).await
        }
        Err(e) => {
            warn!("Failed to remove directory {:?}: {}", path, e);
            reply(writer, e.to_ftp_response()).await
        }
    }
}
