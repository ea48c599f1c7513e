use crate::core_ftpcommand::utils::{reply, CommandContext, Flow};
use crate::core_protocol::codes::FILE_STATUS;
use crate::core_protocol::Response;
use crate::session::Session;
use tokio::io::AsyncWrite;

/// Handles the SIZE FTP command: the size in bytes of a regular file.
pub async fn handle_size_command<W>(
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

    match ctx.storage.size(&path).await {
        Ok(size) => reply(writer, Response::new(FILE_STATUS, size.to_string())).await,
        Err(e) => reply(writer, e.to_ftp_response()).await,
    }
}
