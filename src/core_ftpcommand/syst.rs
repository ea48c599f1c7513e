use crate::constants::SYSTEM_TYPE;
use crate::core_ftpcommand::utils::{reply, Flow};
use crate::core_protocol::codes::SYSTEM_TYPE as SYSTEM_TYPE_CODE;
use crate::core_protocol::Response;
use tokio::io::AsyncWrite;

/// Handles the SYST (System) FTP command.
///
/// Listings are produced in `ls -l` form, so the server always reports UNIX.
pub async fn handle_syst_command<W>(writer: &mut W) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    reply(writer, Response::new(SYSTEM_TYPE_CODE, SYSTEM_TYPE)).await
}
