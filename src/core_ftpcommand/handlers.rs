use crate::core_ftpcommand::ftpcommand::{CommandClass, FtpCommand};
use crate::core_ftpcommand::utils::{reply, CommandContext, Flow};
use crate::core_ftpcommand::{
    cdup, cwd, dele, feat, list, mdtm, mkd, noop, pass, pasv, pwd, quit, retr, rmd, rnfr, rnto,
    size, stor, syst, type_, user,
};
use crate::core_protocol::codes::{CANT_OPEN_DATA_CONNECTION, NOT_LOGGED_IN};
use crate::core_protocol::Response;
use crate::session::Session;
use log::{debug, warn};
use tokio::io::AsyncWrite;

/// Parses one command line and runs it against the session.
///
/// Every line gets exactly one reply (two for transfers: `150` then the
/// outcome). Only a failure to write on the control connection is returned
/// as an error.
pub async fn handle_command<W>(
    writer: &mut W,
    ctx: &CommandContext,
    session: &mut Session,
    line: &str,
) -> Result<Flow, std::io::Error>
where
    W: AsyncWrite + Unpin + Send,
{
    let command = match FtpCommand::parse(line) {
        Ok(command) => command,
        Err(e) => {
            debug!("Rejected command line from {}: {}", session.peer_addr(), e);
            return reply(writer, e.to_ftp_response()).await;
        }
    };
    debug!("<- {} from {}", command.name(), session.peer_addr());

    match command.class() {
        CommandClass::SessionManagement => {}
        _ if !session.is_authenticated() => {
            warn!("{} before login from {}", command.name(), session.peer_addr());
            return reply(
                writer,
                Response::new(NOT_LOGGED_IN, "Please login with USER and PASS."),
            )
            .await;
        }
        CommandClass::Transfer if !session.has_listening_channel() => {
            return reply(
                writer,
                Response::new(CANT_OPEN_DATA_CONNECTION, "Use PASV or EPSV first."),
            )
            .await;
        }
        _ => {}
    }

    // RNTO must come right after RNFR.
    if !matches!(command, FtpCommand::RNTO(_)) {
        session.take_rename_pending();
    }

    match command {
        FtpCommand::USER(arg) => user::handle_user_command(writer, session, arg).await,
        FtpCommand::PASS(arg) => pass::handle_pass_command(writer, session, arg).await,
        FtpCommand::QUIT => quit::handle_quit_command(writer, session).await,
        FtpCommand::NOOP => noop::handle_noop_command(writer).await,
        FtpCommand::SYST => syst::handle_syst_command(writer).await,
        FtpCommand::FEAT => feat::handle_feat_command(writer).await,
        FtpCommand::PWD => pwd::handle_pwd_command(writer, session).await,
        FtpCommand::CWD(arg) => cwd::handle_cwd_command(writer, ctx, session, arg).await,
        FtpCommand::CDUP => cdup::handle_cdup_command(writer, ctx, session).await,
        FtpCommand::TYPE(arg) => type_::handle_type_command(writer, session, arg).await,
        FtpCommand::RNFR(arg) => rnfr::handle_rnfr_command(writer, ctx, session, arg).await,
        FtpCommand::RNTO(arg) => rnto::handle_rnto_command(writer, ctx, session, arg).await,
        FtpCommand::DELE(arg) => dele::handle_dele_command(writer, ctx, session, arg).await,
        FtpCommand::MKD(arg) => mkd::handle_mkd_command(writer, ctx, session, arg).await,
        FtpCommand::RMD(arg) => rmd::handle_rmd_command(writer, ctx, session, arg).await,
        FtpCommand::SIZE(arg) => size::handle_size_command(writer, ctx, session, arg).await,
        FtpCommand::MDTM(arg) => mdtm::handle_mdtm_command(writer, ctx, session, arg).await,
        FtpCommand::PASV => pasv::handle_pasv_command(writer, ctx, session).await,
        FtpCommand::EPSV(arg) => pasv::handle_epsv_command(writer, ctx, session, arg).await,
        FtpCommand::LIST(arg) => list::handle_list_command(writer, ctx, session, arg, false).await,
        FtpCommand::NLST(arg) => list::handle_list_command(writer, ctx, session, arg, true).await,
        FtpCommand::RETR(arg) => retr::handle_retr_command(writer, ctx, session, arg).await,
        FtpCommand::STOR(arg) => stor::handle_stor_command(writer, ctx, session, arg).await,
    }
}
