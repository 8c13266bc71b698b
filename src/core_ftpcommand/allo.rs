use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{send_reply, ControlWriter};

/// ALLO is accepted and ignored; files grow as needed.
pub async fn handle_allo_command(writer: &mut ControlWriter) -> std::io::Result<()> {
    send_reply(writer, &Reply::new(202, "No storage allocation necessary.")).await
}
