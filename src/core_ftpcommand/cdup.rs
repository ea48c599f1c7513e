use crate::core_ftpcommand::cwd::change_directory;
use crate::core_ftpcommand::utils::{reply, CommandContext, Flow};
use crate::core_protocol::codes::FILE_ACTION_OK;
use crate::core_protocol::Response;
use crate::session::Session;
use tokio::io::AsyncWrite;

/// Handles the CDUP (Change to Parent Directory) FTP command.
///
/// Same as `CWD ..`; at the root it stays at the root.
pub async fn handle_cdup_command<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &mut Session,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    match change_directory(ctx, session, "..").await {
        Ok(()) => reply(writer, Response::new(FILE_ACTION_OK, "Directory successfully changed.")).await,
        Err(response) => reply(writer, response).await,
    }
}
