use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{send_reply, ControlWriter};

pub async fn handle_syst_command(writer: &mut ControlWriter) -> std::io::Result<()> {
    send_reply(writer, &Reply::new(215, "UNIX Type: L8")).await
}
