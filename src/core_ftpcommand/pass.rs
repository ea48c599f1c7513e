use crate::core_ftpcommand::utils::{reply, Flow};
use crate::core_protocol::codes::LOGGED_IN;
use crate::core_protocol::Response;
use crate::session::Session;
use log::info;
use tokio::io::AsyncWrite;

/// Handles the PASS FTP command.
///
/// The server runs without an account database: every password is accepted
/// and the session becomes authenticated.
pub async fn handle_pass_command<W>(
    writer: &mut W,
    session: &mut Session,
    _arg: String,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    session.complete_login();
    info!(
        "User {} logged in from {}",
        session.username().unwrap_or("(none)"),
        session.peer_addr()
    );
    reply(writer, Response::new(LOGGED_IN, "User logged in, proceed.")).await
}
