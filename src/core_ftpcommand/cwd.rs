use crate::core_ftpcommand::utils::{reply, CommandContext, Flow};
use crate::core_protocol::codes::FILE_ACTION_OK;
use crate::core_protocol::Response;
use crate::core_storage::{EntryKind, StorageError};
use crate::session::Session;
use log::{debug, warn};
use tokio::io::AsyncWrite;

/// Handles the CWD (Change Working Directory) FTP command.
///
/// The target must resolve inside the root and be a directory. On any
/// failure the working directory is left untouched.
///
/// # Arguments
///
/// * `writer` - The control connection.
/// * `ctx` - Shared server configuration and storage.
/// * `session` - The session of the connection.
/// * `arg` - The directory to change to, absolute or relative.
///
/// # Returns
///
/// Result<Flow, std::io::Error>, an error only if the reply could not be written.
pub async fn handle_cwd_command<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &mut Session,
    arg: String,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    match change_directory(ctx, session, &arg).await {
        Ok(()) => reply(writer, Response::new(FILE_ACTION_OK, "Directory successfully changed.")).await,
        Err(response) => reply(writer, response).await,
    }
}

/// Shared by CWD and CDUP.
pub(crate) async fn change_directory(
    ctx: &CommandContext,
    session: &mut Session,
    arg: &str,
) -> Result<(), Response> {
    let path = session.resolve(arg).map_err(|e| e.to_ftp_response())?;
    match ctx.storage.entry_kind(&path).await {
        Ok(EntryKind::Directory) => {}
        Ok(_) => return Err(StorageError::NotADirectory.to_ftp_response()),
        Err(e) => {
            warn!("CWD {:?} failed: {}", arg, e);
            return Err(e.to_ftp_response());
        }
    }

    let new_dir = session.virtual_path(arg);
    debug!("Working directory of {} is now {}", session.peer_addr(), new_dir);
    session.set_working_dir(new_dir);
    Ok(())
}
