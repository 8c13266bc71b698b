use crate::core_auth::Permission;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{or_reply, required_arg, resolve_path, send_reply, ControlWriter};
use crate::server::ServerContext;
use crate::session::Session;
use log::{info, warn};

/// Handles the DELE FTP command. Directories are left to RMD.
pub async fn handle_dele_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let account = or_reply!(writer, session.require(Permission::Delete));
    let arg = or_reply!(writer, required_arg(arg));
    let resolved = or_reply!(writer, resolve_path(ctx, session, &account, arg));

    match tokio::fs::symlink_metadata(&resolved.real).await {
        Ok(meta) if meta.is_dir() => {
            return send_reply(writer, &Reply::new(550, "Is a directory.")).await;
        }
        Ok(_) => {}
        Err(_) => return send_reply(writer, &Reply::new(550, "No such file.")).await,
    }

    let reply = match tokio::fs::remove_file(&resolved.real).await {
        Ok(()) => {
            info!("{} deleted {}", account.username(), resolved.virtual_path);
            Reply::new(250, "File removed.")
        }
        Err(e) => {
            warn!("Failed to delete {}: {}", resolved.virtual_path, e);
            Reply::new(550, "Delete operation failed.")
        }
    };
    send_reply(writer, &reply).await
}
