use crate::core_ftpcommand::utils::{
    abandon_transfer, begin_transfer, reply, CommandContext, Flow,
};
use crate::core_protocol::codes::{CANT_OPEN_DATA_CONNECTION, TRANSFER_COMPLETE};
use crate::core_protocol::Response;
use crate::core_storage::{EntryKind, StorageError};
use crate::session::Session;
use log::{error, info, warn};
use tokio::io::AsyncWrite;

/// Handles the STOR (Store) FTP command.
///
/// The destination is resolved and checked before `150`. The upload is read
/// until the client closes the data connection, then written in one piece,
/// replacing an existing file. Parent directories are not created. Uploads
/// over `max_upload_size` are aborted with `552` and nothing is written.
///
/// # Arguments
///
/// * `writer` - The control connection.
/// * `ctx` - Shared server configuration and storage.
/// * `session` - The session holding the data channel.
/// * `arg` - The destination file.
///
/// # Returns
///
/// Result<Flow, std::io::Error>, an error only if a reply could not be written.
pub async fn handle_stor_command<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &mut Session,
    arg: String,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut channel = match session.take_data_channel() {
        Some(channel) => channel,
        None => {
            return reply(writer, Response::new(CANT_OPEN_DATA_CONNECTION, "Use PASV or EPSV first."))
                .await
        }
    };

    let path = match session.resolve(&arg) {
        Ok(path) => path,
        Err(e) => return abandon_transfer(writer, channel, e.to_ftp_response()).await,
    };

    match ctx.storage.entry_kind(&path).await {
        Ok(EntryKind::File) | Err(StorageError::NotFound) => {}
        Ok(_) => {
            return abandon_transfer(writer, channel, StorageError::IsDirectory.to_ftp_response())
                .await
        }
        Err(e) => return abandon_transfer(writer, channel, e.to_ftp_response()).await,
    }
    if let Some(parent) = path.parent() {
        match ctx.storage.entry_kind(parent).await {
            Ok(EntryKind::Directory) => {}
            Ok(_) => {
                return abandon_transfer(writer, channel, StorageError::NotADirectory.to_ftp_response())
                    .await
            }
            Err(e) => return abandon_transfer(writer, channel, e.to_ftp_response()).await,
        }
    }

    if !begin_transfer(writer, ctx, session, &mut channel, &arg).await? {
        return Ok(Flow::Continue);
    }

    let received = channel.receive_all().await;
    channel.close();
    let data = match received {
        Ok(data) => data,
        Err(e) => {
            warn!("Upload of {:?} aborted: {}", path, e);
            return reply(writer, e.to_ftp_response()).await;
        }
    };

    match ctx.storage.write_file(&path, &data).await {
        Ok(bytes) => {
            info!("Stored {} bytes in {:?}", bytes, path);
            reply(writer, Response::new(TRANSFER_COMPLETE, "Transfer complete.")).await
        }
        Err(e) => {
            error!("Failed to write {:?}: {}", path, e);
            reply(writer, e.to_ftp_response()).await
        }
    }
}
