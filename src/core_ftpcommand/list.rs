use crate::core_ftpcommand::utils::{
    abandon_transfer, begin_transfer, end_transfer, reply, CommandContext, Flow,
};
use crate::core_protocol::codes::CANT_OPEN_DATA_CONNECTION;
use crate::core_protocol::Response;
use crate::session::Session;
use log::{debug, warn};
use tokio::io::AsyncWrite;

/// Drops leading `-flags` (`LIST -la /pub`), which clients send out of habit.
fn listing_target(arg: Option<&str>) -> &str {
    let mut rest = arg.unwrap_or("").trim();
    while rest.starts_with('-') {
        rest = match rest.split_once(' ') {
            Some((_, tail)) => tail.trim_start(),
            None => "",
        };
    }
    if rest.is_empty() {
        "."
    } else {
        rest
    }
}

/// Handles the LIST and NLST FTP commands.
///
/// LIST sends `ls -l` style lines, NLST bare names. The listing is built
/// before `150` is sent, so a bad path is answered with `550` and no data
/// connection is made.
///
/// # Arguments
///
/// * `writer` - The control connection.
/// * `ctx` - Shared server configuration and storage.
/// * `session` - The session holding the data channel.
/// * `arg` - Optional flags and path.
/// * `names_only` - `true` for NLST.
///
/// # Returns
///
/// Result<Flow, std::io::Error>, an error only if a reply could not be written.
pub async fn handle_list_command<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &mut Session,
    arg: Option<String>,
    names_only: bool,
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

    let target = listing_target(arg.as_deref());
    let path = match session.resolve(target) {
        Ok(path) => path,
        Err(e) => return abandon_transfer(writer, channel, e.to_ftp_response()).await,
    };

    let listing = if names_only {
        ctx.storage.list_names(&path).await
    } else {
        ctx.storage.list_entries(&path).await
    };
    let listing = match listing {
        Ok(listing) => listing,
        Err(e) => {
            warn!("Listing {:?} failed: {}", path, e);
            return abandon_transfer(writer, channel, e.to_ftp_response()).await;
        }
    };
    debug!("Listing {:?}: {} bytes", path, listing.len());

    if !begin_transfer(writer, ctx, session, &mut channel, "file list").await? {
        return Ok(Flow::Continue);
    }
    let outcome = channel.send_all(listing.as_bytes()).await;
    end_transfer(writer, session, channel, outcome).await
}
