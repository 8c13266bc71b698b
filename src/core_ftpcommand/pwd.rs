use crate::core_ftpcommand::reply::{quote_path, Reply};
use crate::core_ftpcommand::utils::{send_reply, ControlWriter};
use crate::session::Session;

pub async fn handle_pwd_command(writer: &mut ControlWriter, session: &mut Session) -> std::io::Result<()> {
    let reply = Reply::new(
        257,
        format!("{} is the current directory.", quote_path(&session.current_dir)),
    );
    send_reply(writer, &reply).await
}
