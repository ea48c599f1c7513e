use crate::constants::FEATURES;
use crate::core_ftpcommand::utils::{reply, Flow};
use crate::core_protocol::codes::SYSTEM_STATUS;
use crate::core_protocol::Response;
use tokio::io::AsyncWrite;

/// Handles the FEAT FTP command.
///
/// ```text
/// 211-Features:
/// 211- EPSV
/// ...
/// 211 End
/// ```
pub async fn handle_feat_command<W>(writer: &mut W) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    let lines = std::iter::once("Features:".to_string())
        .chain(FEATURES.iter().map(|feature| format!(" {}", feature)))
        .chain(std::iter::once("End".to_string()));
    reply(writer, Response::multi(SYSTEM_STATUS, lines)).await
}
