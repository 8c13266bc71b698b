use crate::core_auth::AuthError;
use crate::core_ftpcommand::ftpcommand::{Command, FtpCommand};
use crate::core_ftpcommand::utils::{send_reply, ControlWriter};
use crate::core_ftpcommand::*;
use crate::core_network::{pasv, port};
use crate::server::ServerContext;
use crate::session::Session;
use log::debug;

/// Runs one command against the session and writes its reply.
///
/// Out-of-state commands get an error reply and leave the session as it
/// was; only a failing control socket surfaces as `Err`.
pub async fn dispatch(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    command: Command,
) -> std::io::Result<()> {
    let Command { verb, arg } = command;

    // RNFR only survives until the next command; RNTO consumes it.
    if verb != FtpCommand::RNTO && session.rename_from.take().is_some() {
        debug!("Pending rename cleared by {:?}", verb);
    }

    if !verb.allowed_before_login() && !session.is_authenticated() {
        return send_reply(writer, &AuthError::NotLoggedIn.to_ftp_response()).await;
    }

    let arg = arg.as_str();
    match verb {
        FtpCommand::USER => user::handle_user_command(writer, ctx, session, arg).await,
        FtpCommand::PASS => pass::handle_pass_command(writer, ctx, session, arg).await,
        FtpCommand::QUIT => quit::handle_quit_command(writer, session).await,
        FtpCommand::PWD => pwd::handle_pwd_command(writer, session).await,
        FtpCommand::CWD => cwd::handle_cwd_command(writer, ctx, session, arg).await,
        FtpCommand::CDUP => cwd::handle_cwd_command(writer, ctx, session, "..").await,
        FtpCommand::TYPE => type_::handle_type_command(writer, session, arg).await,
        FtpCommand::STRU => type_::handle_stru_command(writer, arg).await,
        FtpCommand::MODE => type_::handle_mode_command(writer, arg).await,
        FtpCommand::PASV => pasv::handle_pasv_command(writer, ctx, session, arg).await,
        FtpCommand::EPSV => pasv::handle_epsv_command(writer, ctx, session, arg).await,
        FtpCommand::PORT => port::handle_port_command(writer, ctx, session, arg).await,
        FtpCommand::EPRT => port::handle_eprt_command(writer, ctx, session, arg).await,
        FtpCommand::RETR => retr::handle_retr_command(writer, ctx, session, arg).await,
        FtpCommand::STOR => stor::handle_stor_command(writer, ctx, session, arg, false).await,
        FtpCommand::APPE => stor::handle_stor_command(writer, ctx, session, arg, true).await,
        FtpCommand::LIST => list::handle_list_command(writer, ctx, session, arg, false).await,
        FtpCommand::NLST => list::handle_list_command(writer, ctx, session, arg, true).await,
        FtpCommand::DELE => dele::handle_dele_command(writer, ctx, session, arg).await,
        FtpCommand::RNFR => rnfr::handle_rnfr_command(writer, ctx, session, arg).await,
        FtpCommand::RNTO => rnto::handle_rnto_command(writer, ctx, session, arg).await,
        FtpCommand::MKD => mkd::handle_mkd_command(writer, ctx, session, arg).await,
        FtpCommand::RMD => rmd::handle_rmd_command(writer, ctx, session, arg).await,
        FtpCommand::SIZE => size::handle_size_command(writer, ctx, session, arg).await,
        FtpCommand::MDTM => mdtm::handle_mdtm_command(writer, ctx, session, arg).await,
        FtpCommand::NOOP => noop::handle_noop_command(writer).await,
        FtpCommand::SYST => syst::handle_syst_command(writer).await,
        FtpCommand::FEAT => feat::handle_feat_command(writer).await,
        FtpCommand::ALLO => allo::handle_allo_command(writer).await,
        FtpCommand::ABOR => abor::handle_abor_command(writer, session).await,
    }
}
