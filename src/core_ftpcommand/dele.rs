use crate::core_ftpcommand::utils::{reply, CommandContext, Flow};
use crate::core_protocol::codes::FILE_ACTION_OK;
use crate::core_protocol::Response;
use crate::session::Session;
use log::{info, warn};
use tokio::io::AsyncWrite;

/// Handles the DELE (Delete) FTP command. Directories are refused; see RMD.
pub async fn handle_dele_command<W>(
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

    match ctx.storage.delete_file(&path).await {
        Ok(()) => {
            info!("Deleted file: {:?}", path);
            reply(writer, Response::new(FILE_ACTION_OK, "File deleted.")).await
        }
        Err(e) => {
            warn!("Failed to delete {:?}: {}", path, e);
            reply(writer, e.to_ftp_response()).await
        }
    }
}
