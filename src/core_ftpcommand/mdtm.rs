use crate::core_ftpcommand::utils::{reply, CommandContext, Flow};
use crate::core_protocol::codes::FILE_STATUS;
use crate::core_protocol::Response;
use crate::session::Session;
use log::debug;
use tokio::io::AsyncWrite;

/// Handles the MDTM FTP command.
///
/// Replies `213 YYYYMMDDHHMMSS`, the modification time in UTC.
pub async fn handle_mdtm_command<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &mut Session,
    arg: String,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    let path = match session.resolve(&arg) {
        Ok(path) => path,
        Err(e) => return reply(writer, e.to_ftp_response()).await,
    };

    match ctx.storage.modified_time(&path).await {
        Ok(modified) => {
            debug!("MDTM {:?}: {}", path, modified);
            reply(
                writer,
                Response::new(FILE_STATUS, modified.format("%Y%m%d%H%M%S").to_string()),
            )
            .await
        }
        Err(e) => reply(writer, e.to_ftp_response()).await,
    }
}
