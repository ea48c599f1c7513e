use crate::core_ftpcommand::utils::Flow;
use crate::core_protocol::codes::CLOSING_CONTROL;
use crate::core_protocol::Response;
use crate::helpers::send_response;
use crate::session::Session;
use log::info;
use tokio::io::AsyncWrite;

/// Handles the QUIT FTP command.
///
/// Sends `221` and tells the connection loop to stop. The session, and any
/// data channel it holds, is dropped with the connection.
pub async fn handle_quit_command<W>(
    writer: &mut W,
    session: &mut Session,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    info!("Received QUIT command from {}. Closing connection.", session.peer_addr());
    session.close_data_channel();
    send_response(writer, &Response::new(CLOSING_CONTROL, "Goodbye.")).await?;
    Ok(Flow::Close)
}
