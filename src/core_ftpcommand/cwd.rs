use crate::core_auth::Permission;
use crate::core_ftpcommand::reply::{quote_path, Reply};
use crate::core_ftpcommand::utils::{or_reply, required_arg, resolve_path, send_reply, ControlWriter};
use crate::server::ServerContext;
use crate::session::Session;
use log::{info, warn};

/// Handles CWD (and CDUP, which arrives here as `CWD ..`).
///
/// The working directory only changes when the target resolves inside the
/// home directory and is a directory; otherwise it is left untouched.
pub async fn handle_cwd_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let account = or_reply!(writer, session.require(Permission::ChangeDir));
    let arg = or_reply!(writer, required_arg(arg));
    let resolved = or_reply!(writer, resolve_path(ctx, session, &account, arg));

    match tokio::fs::metadata(&resolved.real).await {
        Ok(meta) if meta.is_dir() => {
            session.current_dir = resolved.virtual_path;
            info!("Directory successfully changed to: {}", session.current_dir);
            let reply = Reply::new(
                250,
                format!("{} is the current directory.", quote_path(&session.current_dir)),
            );
            send_reply(writer, &reply).await
        }
        _ => {
            warn!("Failed to change directory to: {}", resolved.virtual_path);
            send_reply(writer, &Reply::new(550, "No such directory.")).await
        }
    }
}
