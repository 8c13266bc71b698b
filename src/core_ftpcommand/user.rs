use crate::constants::ANONYMOUS_USERNAME;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{or_reply, required_arg, send_reply, ControlWriter};
use crate::server::ServerContext;
use crate::session::Session;
use log::info;

/// Handles the USER FTP command.
///
/// Starts (or restarts) a login: any previous login and prepared data
/// channel are dropped and the session waits for PASS. Unknown users get the
/// same reply as known ones.
pub async fn handle_user_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let username = or_reply!(writer, required_arg(arg)).trim();
    info!("Received USER command with username: {}", username);

    if session.is_authenticated() {
        info!("{} logging in again, previous login dropped", session.peer_addr);
    }
    session.begin_login(username.to_string());

    let reply = if username.eq_ignore_ascii_case(ANONYMOUS_USERNAME)
        && ctx.authorizer.has_user(ANONYMOUS_USERNAME)
    {
        Reply::new(331, "Anonymous login okay, send your email address as password.")
    } else {
        Reply::new(331, "User name okay, need password.")
    };
    send_reply(writer, &reply).await
}
