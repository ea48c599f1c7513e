use crate::core_ftpcommand::utils::{reply, Flow};
use crate::core_protocol::codes::NEED_PASSWORD;
use crate::core_protocol::Response;
use crate::session::Session;
use log::info;
use tokio::io::AsyncWrite;

/// Handles the USER FTP command.
///
/// Any user name is accepted. A new USER restarts the login sequence, even
/// for a session that is already logged in.
///
/// # Arguments
///
/// * `writer` - The control connection.
/// * `session` - The session of the connection.
/// * `arg` - The user name.
///
/// # Returns
///
/// Result<Flow, std::io::Error>, an error only if the reply could not be written.
pub async fn handle_user_command<W>(
    writer: &mut W,
    session: &mut Session,
    arg: String,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    info!("USER {} from {}", arg, session.peer_addr());
    session.begin_login(&arg);
    reply(writer, Response::new(NEED_PASSWORD, "User name okay, need password.")).await
}
