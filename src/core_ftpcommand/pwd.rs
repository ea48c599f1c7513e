use crate::core_ftpcommand::utils::{quote_path, reply, Flow};
use crate::core_protocol::codes::PATH_CREATED;
use crate::core_protocol::Response;
use crate::session::Session;
use tokio::io::AsyncWrite;

/// Handles the PWD (Print Working Directory) FTP command.
///
/// Replies with the virtual working directory; quotes inside it are doubled.
pub async fn handle_pwd_command<W>(writer: &mut W, session: &Session) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    let message = format!("{} is the current directory.", quote_path(session.working_dir()));
    reply(writer, Response::new(PATH_CREATED, message)).await
}
