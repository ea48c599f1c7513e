use crate::core_ftpcommand::utils::{quote_path, reply, CommandContext, Flow};
use crate::core_protocol::codes::PATH_CREATED;
use crate::core_protocol::Response;
use crate::session::Session;
use log::{info, warn};
use tokio::io::AsyncWrite;

/// Handles the MKD (Make Directory) FTP command.
///
/// Creates a single directory; the parent must exist. The reply carries the
/// new directory's virtual path.
///
/// # Arguments
///
/// * `writer` - The control connection.
/// * `ctx` - Shared server configuration and storage.
/// * `session` - The session of the connection.
/// * `arg` - The directory to create.
///
/// # Returns
///
/// Result<Flow, std::io::Error>, an error only if the reply could not be written.
pub async fn handle_mkd_command<W>(
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

    match ctx.storage.make_directory(&path).await {
        Ok(()) => {
            let created = session.virtual_path(&arg);
            info!("Directory created: {:?}", path);
            reply(
                writer,
                Response::new(PATH_CREATED, format!("{} directory created.", quote_path(&created))),
            )
            .await
        }
        Err(e) => {
            warn!("Failed to create directory {:?}: {}", path, e);
            reply(writer, e.to_ftp_response()).await
        }
    }
}
