use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{send_reply, ControlWriter};
use crate::session::Session;
use log::info;

/// Handles ABOR.
///
/// Transfers run to completion before the next command is read, so this only
/// drops a prepared but unused data channel.
pub async fn handle_abor_command(writer: &mut ControlWriter, session: &mut Session) -> std::io::Result<()> {
    let reply = if session.discard_data_channel() {
        info!("ABOR: data channel closed for {}", session.peer_addr);
        Reply::new(225, "ABOR command successful; data channel closed.")
    } else {
        Reply::new(225, "No transfer to abort.")
    };
    send_reply(writer, &reply).await
}
