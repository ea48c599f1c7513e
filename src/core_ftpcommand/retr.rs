use crate::core_ftpcommand::utils::{
    abandon_transfer, begin_transfer, end_transfer, reply, CommandContext, Flow,
};
use crate::core_protocol::codes::CANT_OPEN_DATA_CONNECTION;
use crate::core_protocol::Response;
use crate::session::Session;
use log::{error, info};
use tokio::io::AsyncWrite;

/// Handles the RETR (Retrieve) FTP command.
///
/// The file is read from storage before anything is announced, so a missing
/// or forbidden file is answered with a single `550` and the data channel is
/// closed unused. Bytes are sent as stored, whatever the transfer type.
///
/// # Arguments
///
/// * `writer` - The control connection.
/// * `ctx` - Shared server configuration and storage.
/// * `session` - The session holding the data channel.
/// * `arg` - The file to retrieve.
///
/// # Returns
///
/// Result<Flow, std::io::Error>, an error only if a reply could not be written.
pub async fn handle_retr_command<W>(
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

    let data = match ctx.storage.read_file(&path).await {
        Ok(data) => data,
        Err(e) => {
            error!("File could not be read: {:?}, error: {}", path, e);
            return abandon_transfer(writer, channel, e.to_ftp_response()).await;
        }
    };

    let what = format!("{} ({} bytes)", arg, data.len());
    if !begin_transfer(writer, ctx, session, &mut channel, &what).await? {
        return Ok(Flow::Continue);
    }
    info!("Sending file: {:?}", path);
    let outcome = channel.send_all(&data).await;
    end_transfer(writer, session, channel, outcome).await
}
