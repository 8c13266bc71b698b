use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{send_reply, ControlWriter};
use crate::session::Session;
use log::info;

/// Handles the QUIT FTP command.
///
/// Tears the session down (data channel and passive port included) before
/// saying goodbye; the connection loop stops after this reply.
pub async fn handle_quit_command(
    writer: &mut ControlWriter,
    session: &mut Session,
) -> std::io::Result<()> {
    info!("Received QUIT command from {}. Closing connection.", session.peer_addr);
    session.close();
    send_reply(writer, &Reply::new(221, "Goodbye.")).await
}
