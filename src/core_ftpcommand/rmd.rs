use crate::core_auth::Permission;
use crate::core_ftpcommand::reply::Reply;
use crate::core_ftpcommand::utils::{or_reply, required_arg, resolve_path, send_reply, ControlWriter};
use crate::server::ServerContext;
use crate::session::Session;
use log::{info, warn};

/// Handles the RMD FTP command. Only empty directories are removed.
pub async fn handle_rmd_command(
    writer: &mut ControlWriter,
    ctx: &ServerContext,
    session: &mut Session,
    arg: &str,
) -> std::io::Result<()> {
    let account = or_reply!(writer, session.require(Permission::Delete));
    let arg = or_reply!(writer, required_arg(arg));
    let resolved = or_reply!(writer, resolve_path(ctx, session, &account, arg));

    if resolved.is_home() {
        return send_reply(writer, &Reply::new(550, "Can't remove home directory.")).await;
    }
    match tokio::fs::symlink_metadata(&resolved.real).await {
        Ok(meta) if meta.is_dir() => {}
        _ => return send_reply(writer, &Reply::new(550, "Not a directory.")).await,
    }

    let reply = match tokio::fs::remove_dir(&resolved.real).await {
        Ok(()) => {
            info!("Removed directory {}", resolved.virtual_path);
            Reply::new(250, "Directory removed.")
        }
        Err(e) => {
            warn!("Failed to remove directory {}: {}", resolved.virtual_path, e);
            Reply::new(550, "Remove directory operation failed.")
        }
    };
    send_reply(writer, &reply).await
}
