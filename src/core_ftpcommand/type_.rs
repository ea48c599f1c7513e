use crate::core_ftpcommand::utils::{reply, Flow};
use crate::core_protocol::codes::{COMMAND_OK, NOT_IMPLEMENTED_FOR_PARAM};
use crate::core_protocol::Response;
use crate::session::{Session, TransferType};
use log::debug;
use tokio::io::AsyncWrite;

/// Handles the TYPE FTP command.
///
/// `A` and `A N` select ASCII, `I` and `L 8` select binary. Other types and
/// format controls are rejected with `504` and leave the session unchanged.
/// Transfers are byte-exact in both modes.
pub async fn handle_type_command<W>(
    writer: &mut W,
    session: &mut Session,
    arg: String,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    let parts: Vec<String> = arg
        .split_whitespace()
        .map(|s| s.to_ascii_uppercase())
        .collect();
    let parts: Vec<&str> = parts.iter().map(String::as_str).collect();

    let (transfer_type, name) = match parts.as_slice() {
        ["A"] | ["A", "N"] => (TransferType::Ascii, "A"),
        ["I"] | ["L", "8"] => (TransferType::Binary, "I"),
        _ => {
            debug!("Unsupported TYPE {:?}", arg);
            return reply(
                writer,
                Response::new(NOT_IMPLEMENTED_FOR_PARAM, "Command not implemented for that parameter."),
            )
            .await;
        }
    };

    session.set_transfer_type(transfer_type);
    reply(writer, Response::new(COMMAND_OK, format!("Type set to {}.", name))).await
}
