use crate::core_ftpcommand::utils::{reply, Flow};
use crate::core_protocol::codes::COMMAND_OK;
use crate::core_protocol::Response;
use tokio::io::AsyncWrite;

pub async fn handle_noop_command<W>(writer: &mut W) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    reply(writer, Response::new(COMMAND_OK, "NOOP ok.")).await
}
